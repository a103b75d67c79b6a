pub mod contacts_view;
pub mod main_window;
pub mod services_view;
pub mod setup;

use std::path::PathBuf;

use adw::prelude::*;
use gtk4 as gtk;
use log::warn;

use crate::api::models::ImageRef;
use crate::api::ApiClient;
use crate::state::{Notice, NoticeLevel};

pub fn toast(overlay: &adw::ToastOverlay, notice: &Notice) {
    let toast = adw::Toast::new(&notice.message);
    if notice.level == NoticeLevel::Error {
        toast.set_timeout(5);
    }
    overlay.add_toast(toast);
}

pub fn clear_box(container: &gtk::Box) {
    while let Some(child) = container.first_child() {
        container.remove(&child);
    }
}

/// Preview of an image slot. Local files load directly; uploaded images are
/// downloaded in the background and fill in when they arrive.
pub fn image_preview(api: &ApiClient, image: &ImageRef, size: i32) -> gtk::Picture {
    let picture = gtk::Picture::new();
    picture.set_size_request(size, size);
    picture.set_can_shrink(true);
    match image {
        ImageRef::Empty => picture.set_visible(false),
        ImageRef::Pending(path) => picture.set_filename(Some(path)),
        ImageRef::Remote(url) => fill_remote(api, url, &picture),
    }
    picture
}

fn fill_remote(api: &ApiClient, url: &str, picture: &gtk::Picture) {
    let api = api.clone();
    let url = url.to_string();
    let rx = crate::utils::run_async_to_main(async move { api.fetch_image(&url).await });
    let weak = picture.downgrade();
    rx.attach(None, move |res| {
        let Some(picture) = weak.upgrade() else {
            return glib::ControlFlow::Break;
        };
        let bytes = match res {
            Ok(bytes) => gtk::glib::Bytes::from_owned(bytes),
            Err(e) => {
                warn!("Image preview unavailable: {e}");
                return glib::ControlFlow::Break;
            }
        };
        match gtk::gdk::Texture::from_bytes(&bytes) {
            Ok(texture) => picture.set_paintable(Some(&texture)),
            Err(e) => warn!("Image preview could not be decoded: {e}"),
        }
        glib::ControlFlow::Break
    });
}

/// Ask for an image file and pass its path to `on_pick`.
pub fn choose_image<F>(parent: &gtk::Window, on_pick: F)
where
    F: Fn(PathBuf) + 'static,
{
    let chooser = gtk::FileChooserNative::new(
        Some("Choose image"),
        Some(parent),
        gtk::FileChooserAction::Open,
        Some("Open"),
        Some("Cancel"),
    );
    let filter = gtk::FileFilter::new();
    filter.set_name(Some("Images"));
    filter.add_mime_type("image/*");
    chooser.add_filter(&filter);

    // the closure owns a handle so the dialog outlives this function
    let keep = chooser.clone();
    chooser.connect_response(move |dialog, resp| {
        if resp == gtk::ResponseType::Accept {
            if let Some(path) = dialog.file().and_then(|f| f.path()) {
                on_pick(path);
            }
        }
        keep.destroy();
    });
    chooser.show();
}

/// Modal yes/cancel dialog; `on_confirm` runs only on the destructive answer.
pub fn confirm<F>(parent: &gtk::Window, title: &str, text: &str, accept_label: &str, on_confirm: F)
where
    F: Fn() + 'static,
{
    let dialog = gtk::Dialog::builder()
        .title(title)
        .transient_for(parent)
        .modal(true)
        .build();
    let label = gtk::Label::new(Some(text));
    label.set_wrap(true);
    label.set_margin_top(12);
    label.set_margin_bottom(12);
    label.set_margin_start(12);
    label.set_margin_end(12);
    dialog.content_area().append(&label);

    let _ = dialog.add_button("Cancel", gtk::ResponseType::Cancel);
    let ok_btn = dialog.add_button(accept_label, gtk::ResponseType::Accept);
    ok_btn.add_css_class("destructive-action");
    dialog.set_default_response(gtk::ResponseType::Cancel);

    dialog.connect_response(move |dlg, resp| {
        if resp == gtk::ResponseType::Accept {
            on_confirm();
        }
        dlg.close();
    });
    dialog.present();
}
