use std::borrow::Cow;
use std::path::PathBuf;

use log::{debug, error, info, warn};

use crate::api::models::{ImageRef, ItemField, Section, SectionItem, Service, TechStack};
use crate::api::payload::ServicePayload;
use crate::api::{ApiClient, ApiError};
use crate::state::Notice;
use crate::utils::truncate;

pub const DESCRIPTION_PREVIEW_LIMIT: usize = 100;
pub const SUBTITLE_PREVIEW_LIMIT: usize = 40;

pub fn preview(text: &str) -> Cow<'_, str> {
    truncate(text, DESCRIPTION_PREVIEW_LIMIT)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitTarget {
    Create,
    Update(String),
}

impl SubmitTarget {
    pub fn success_message(&self) -> &'static str {
        match self {
            SubmitTarget::Create => "Service added successfully!",
            SubmitTarget::Update(_) => "Service updated successfully!",
        }
    }
}

/// A save captured from the draft; sendable off the UI thread.
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    pub target: SubmitTarget,
    pub payload: ServicePayload,
}

impl SubmitRequest {
    pub async fn send(self, api: &ApiClient) -> Result<(), ApiError> {
        match self.target {
            SubmitTarget::Create => api.create_service(self.payload).await,
            SubmitTarget::Update(id) => api.update_service(&id, self.payload).await,
        }
    }
}

/// The services page: the saved list, the tech-stack catalog and the form draft.
///
/// The draft is either new (`id` unset) or an existing service loaded for
/// editing. `staged` holds the tech stacks picked for the draft, and
/// `draft.tools` always mirrors their identifiers after a change.
///
/// Loads may overlap (refresh while a reload is running), so loading is a
/// count of outstanding fetches. While a save is in flight `submitted` holds
/// the draft exactly as it was sent.
#[derive(Debug)]
pub struct ServicesState {
    services: Vec<Service>,
    catalog: Vec<TechStack>,
    draft: Service,
    staged: Vec<TechStack>,
    pending_loads: usize,
    submitted: Option<Service>,
}

impl Default for ServicesState {
    fn default() -> Self {
        Self {
            services: Vec::new(),
            catalog: Vec::new(),
            draft: Service::blank(),
            staged: Vec::new(),
            pending_loads: 0,
            submitted: None,
        }
    }
}

impl ServicesState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn catalog(&self) -> &[TechStack] {
        &self.catalog
    }

    pub fn draft(&self) -> &Service {
        &self.draft
    }

    pub fn staged(&self) -> &[TechStack] {
        &self.staged
    }

    pub fn is_loading(&self) -> bool {
        self.pending_loads > 0
    }

    pub fn is_submitting(&self) -> bool {
        self.submitted.is_some()
    }

    pub fn is_busy(&self) -> bool {
        self.is_loading() || self.is_submitting()
    }

    pub fn editing_id(&self) -> Option<&str> {
        self.draft.id.as_deref()
    }

    pub fn set_title(&mut self, title: &str) {
        self.draft.title = title.to_string();
    }

    pub fn set_subtitle(&mut self, subtitle: &str) {
        self.draft.subtitle = subtitle.to_string();
    }

    /// Append a blank item and return its index.
    pub fn add_item(&mut self, section: Section) -> usize {
        let items = self.draft.section_mut(section);
        items.push(SectionItem::default());
        items.len() - 1
    }

    /// Sections may end up empty; nothing enforces a minimum.
    pub fn remove_item(&mut self, section: Section, index: usize) -> Option<SectionItem> {
        let items = self.draft.section_mut(section);
        (index < items.len()).then(|| items.remove(index))
    }

    pub fn set_item_field(&mut self, section: Section, index: usize, field: ItemField, value: &str) -> bool {
        let Some(item) = self.draft.section_mut(section).get_mut(index) else {
            return false;
        };
        match field {
            ItemField::Title => item.title = value.to_string(),
            ItemField::Description => item.description = value.to_string(),
        }
        true
    }

    pub fn set_item_image(&mut self, section: Section, index: usize, file: PathBuf) -> bool {
        match self.draft.section_mut(section).get_mut(index) {
            Some(item) => {
                item.image = ImageRef::Pending(file);
                true
            }
            None => false,
        }
    }

    pub fn set_main_image(&mut self, file: PathBuf) {
        self.draft.main_service_image = ImageRef::Pending(file);
    }

    pub fn is_staged(&self, id: &str) -> bool {
        self.staged.iter().any(|s| s.id == id)
    }

    pub fn select_tech_stack(&mut self, stack: &TechStack) -> Notice {
        if self.is_staged(&stack.id) {
            return Notice::error("Tech stack already added!");
        }
        self.staged.push(stack.clone());
        self.sync_tools();
        Notice::success("Tech stack added successfully!")
    }

    pub fn deselect_tech_stack(&mut self, id: &str) -> bool {
        let before = self.staged.len();
        self.staged.retain(|s| s.id != id);
        self.sync_tools();
        self.staged.len() != before
    }

    fn sync_tools(&mut self) {
        self.draft.tools = self.staged.iter().map(|s| s.id.clone()).collect();
    }

    /// Load `service` into the form, replacing the current draft.
    pub fn edit_service(&mut self, service: &Service) {
        debug!("Editing service {:?}", service.id);
        self.draft = service.clone();
        self.draft.tools = service.tool_ids().map(str::to_string).collect();
        self.staged = self
            .catalog
            .iter()
            .filter(|stack| self.draft.tools.iter().any(|id| *id == stack.id))
            .cloned()
            .collect();
    }

    pub fn reset_form(&mut self) {
        self.draft = Service::blank();
        self.staged.clear();
    }

    pub fn begin_load(&mut self) {
        self.pending_loads += 1;
    }

    pub fn apply_load(
        &mut self,
        services: Result<Vec<Service>, ApiError>,
        stacks: Result<Vec<TechStack>, ApiError>,
    ) -> Option<Notice> {
        self.pending_loads = self.pending_loads.saturating_sub(1);
        let mut failure = None;
        match services {
            Ok(list) => {
                info!("Loaded {} services", list.len());
                self.services = list;
            }
            Err(e) => {
                error!("Error fetching services: {e}");
                failure = Some(Notice::error(format!("Failed to load services: {e}")));
            }
        }
        match stacks {
            Ok(list) => {
                info!("Loaded {} tech stacks", list.len());
                self.catalog = list;
            }
            Err(e) => {
                error!("Error fetching tech stacks: {e}");
                failure.get_or_insert_with(|| Notice::error(format!("Failed to load tech stacks: {e}")));
            }
        }
        failure
    }

    /// First required form field left blank: title, subtitle, then each item's description.
    pub fn missing_required(&self) -> Option<String> {
        if self.draft.title.trim().is_empty() {
            return Some("Title".to_string());
        }
        if self.draft.subtitle.trim().is_empty() {
            return Some("Subtitle".to_string());
        }
        Section::ALL.into_iter().find_map(|section| {
            self.draft
                .section(section)
                .iter()
                .position(|item| item.description.trim().is_empty())
                .map(|index| format!("{} item {} description", section.heading(), index + 1))
        })
    }

    /// Capture the draft for sending. Refused while another save is in flight.
    pub fn begin_submit(&mut self) -> Result<SubmitRequest, Notice> {
        if self.is_submitting() {
            warn!("Ignoring submit while a save is in flight");
            return Err(Notice::error("A save is already in progress"));
        }
        let target = match &self.draft.id {
            Some(id) => SubmitTarget::Update(id.clone()),
            None => SubmitTarget::Create,
        };
        let payload = ServicePayload::from_service(&self.draft);
        self.submitted = Some(self.draft.clone());
        Ok(SubmitRequest { target, payload })
    }

    /// After a create the form starts over, unless the draft was changed
    /// while the save was in flight. After an update it keeps editing.
    pub fn finish_submit(&mut self, target: &SubmitTarget, result: Result<(), ApiError>) -> Notice {
        let submitted = self.submitted.take();
        match result {
            Ok(()) => {
                info!("Saved service ({target:?})");
                if *target == SubmitTarget::Create {
                    if submitted.as_ref() == Some(&self.draft) {
                        self.reset_form();
                    } else {
                        debug!("Draft changed during save, keeping it");
                    }
                }
                Notice::success(target.success_message())
            }
            Err(e) => {
                error!("Error saving service: {e}");
                Notice::error(format!("Failed to add/update service: {e}"))
            }
        }
    }

    pub fn delete_prompt(service: &Service) -> String {
        format!("You are about to delete the service: {}", service.title)
    }

    pub fn apply_delete(&mut self, id: &str, title: &str, result: Result<(), ApiError>) -> Notice {
        match result {
            Ok(()) => {
                self.services.retain(|s| s.id.as_deref() != Some(id));
                if self.editing_id() == Some(id) {
                    self.reset_form();
                }
                info!("Deleted service {id}");
                Notice::success(format!("Service: {title} deleted successfully"))
            }
            Err(e) => {
                error!("Error deleting service {id}: {e}");
                Notice::error("Error deleting service")
            }
        }
    }

    /// Fetch services and the tech-stack catalog together.
    pub async fn load(&mut self, api: &ApiClient) -> Option<Notice> {
        self.begin_load();
        let (services, stacks) = tokio::join!(api.services(), api.tech_stacks());
        self.apply_load(services, stacks)
    }

    pub async fn submit(&mut self, api: &ApiClient) -> Notice {
        let request = match self.begin_submit() {
            Ok(request) => request,
            Err(notice) => return notice,
        };
        let target = request.target.clone();
        let result = request.send(api).await;
        let notice = self.finish_submit(&target, result);
        if !notice.is_error() {
            if let Some(reload) = self.load(api).await {
                warn!("Saved, but refreshing the list failed: {}", reload.message);
            }
        }
        notice
    }

    /// Ask `confirm` with the prompt text; delete only if it agrees.
    pub async fn delete_service<F>(&mut self, api: &ApiClient, service: &Service, confirm: F) -> Option<Notice>
    where
        F: FnOnce(&str) -> bool,
    {
        let Some(id) = service.id.as_deref() else {
            return Some(Notice::error("Service has not been saved yet"));
        };
        if !confirm(&Self::delete_prompt(service)) {
            debug!("Delete of service {id} cancelled");
            return None;
        }
        let result = api.delete_service(id).await;
        Some(self.apply_delete(id, &service.title, result))
    }
}
