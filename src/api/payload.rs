use std::path::PathBuf;

use crate::api::models::{Section, Service};

#[derive(Debug, Clone, PartialEq)]
pub enum FormPart {
    Text { name: String, value: String },
    File { name: String, path: PathBuf },
}

impl FormPart {
    pub fn name(&self) -> &str {
        match self {
            FormPart::Text { name, .. } | FormPart::File { name, .. } => name,
        }
    }
}

/// Multipart body for creating or updating a service, in wire order.
/// Files are only referenced here; the client reads them when sending.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServicePayload {
    parts: Vec<FormPart>,
}

impl ServicePayload {
    pub fn from_service(service: &Service) -> Self {
        let mut payload = Self::default();
        payload.text("title", &service.title);
        payload.text("subtitle", &service.subtitle);
        if let Some(path) = service.main_service_image.pending_path() {
            payload.file("mainServiceImage", path.clone());
        }
        payload.text("tools", &service.tools.join(","));

        for section in Section::ALL {
            for (index, item) in service.section(section).iter().enumerate() {
                payload.text(&format!("{section}[{index}][title]"), &item.title);
                payload.text(&format!("{section}[{index}][description]"), &item.description);
                if let Some(path) = item.image.pending_path() {
                    payload.file(&format!("{section}[{index}][image]"), path.clone());
                }
            }
        }
        payload
    }

    fn text(&mut self, name: &str, value: &str) {
        self.parts.push(FormPart::Text { name: name.to_string(), value: value.to_string() });
    }

    fn file(&mut self, name: &str, path: PathBuf) {
        self.parts.push(FormPart::File { name: name.to_string(), path });
    }

    pub fn parts(&self) -> &[FormPart] {
        &self.parts
    }

    pub fn into_parts(self) -> Vec<FormPart> {
        self.parts
    }

    #[cfg(test)]
    pub fn text_value(&self, name: &str) -> Option<&str> {
        self.parts.iter().find_map(|p| match p {
            FormPart::Text { name: n, value } if n == name => Some(value.as_str()),
            _ => None,
        })
    }

    #[cfg(test)]
    pub fn file_names(&self) -> Vec<&str> {
        self.parts
            .iter()
            .filter(|p| matches!(p, FormPart::File { .. }))
            .map(FormPart::name)
            .collect()
    }
}
