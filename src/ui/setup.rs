use adw::prelude::*;
use adw::Application;
use gtk4 as gtk;
use log::{info, warn};

use crate::api::{ApiClient, ApiError};
use crate::app::Settings;

/// Window asking for the dashboard API endpoint.
pub fn show_setup_window(app: &Application) {
    let window = adw::ApplicationWindow::builder()
        .application(app)
        .title("Nexile Admin Setup")
        .default_width(420)
        .default_height(240)
        .resizable(false)
        .build();

    let toast_overlay = adw::ToastOverlay::new();

    let root = gtk::Box::new(gtk::Orientation::Vertical, 12);
    root.set_margin_top(24);
    root.set_margin_bottom(24);
    root.set_margin_start(24);
    root.set_margin_end(24);

    let title = gtk::Label::new(Some("Connect to the dashboard API"));
    title.add_css_class("title-2");
    title.set_halign(gtk::Align::Start);
    root.append(&title);

    let endpoint_entry = gtk::Entry::new();
    endpoint_entry.set_placeholder_text(Some("API endpoint (e.g. https://api.example.com)"));
    endpoint_entry.set_hexpand(true);
    endpoint_entry.set_text(&Settings::load().endpoint);
    root.append(&endpoint_entry);

    let status = gtk::Label::new(None);
    status.add_css_class("dim-label");
    status.set_halign(gtk::Align::Start);
    root.append(&status);

    let connect_btn = gtk::Button::with_label("Connect");
    connect_btn.add_css_class("suggested-action");
    connect_btn.set_halign(gtk::Align::End);
    root.append(&connect_btn);

    toast_overlay.set_child(Some(&root));
    let container = gtk::Box::new(gtk::Orientation::Vertical, 0);
    let header = adw::HeaderBar::new();
    let header_title = gtk::Label::new(Some("Nexile Admin"));
    header.set_title_widget(Some(&header_title));
    container.append(&header);
    container.append(&toast_overlay);
    window.set_content(Some(&container));

    let on_connect = {
        let app = app.clone();
        let window = window.clone();
        let overlay = toast_overlay.clone();
        let endpoint_entry = endpoint_entry.clone();
        let connect_btn = connect_btn.clone();
        move || {
            let endpoint = crate::utils::normalize_url(&endpoint_entry.text());
            if endpoint.is_empty() {
                overlay.add_toast(adw::Toast::new("Please enter the API endpoint."));
                return;
            }

            status.set_label("Connecting…");
            connect_btn.set_sensitive(false);

            let endpoint_for_async = endpoint.clone();
            let rx: glib::Receiver<Result<u16, ApiError>> = crate::utils::run_async_to_main(async move {
                let client = ApiClient::probe(&endpoint_for_async)?;
                client.ping().await
            });

            let status_label = status.clone();
            let app2 = app.clone();
            let window2 = window.clone();
            let overlay2 = overlay.clone();
            let connect_btn2 = connect_btn.clone();
            rx.attach(None, move |res| {
                connect_btn2.set_sensitive(true);
                match res {
                    Ok(code) => {
                        info!("Endpoint check: {endpoint} - HTTP {code}");
                        if !(200..300).contains(&code) {
                            // still usable: the list may simply be protected or empty
                            warn!("Endpoint answered with HTTP {code}");
                        }
                        let settings = Settings { endpoint: endpoint.clone() };
                        if let Err(e) = settings.save() {
                            overlay2.add_toast(adw::Toast::new(&format!("Failed to save settings: {}", e)));
                            status_label.set_label("Not saved");
                            return glib::ControlFlow::Continue;
                        }
                        crate::ui::main_window::show_main_window(&app2, settings);
                        window2.close();
                    }
                    Err(err) => {
                        warn!("Endpoint check failed: {err}");
                        status_label.set_label("Connection failed");
                        overlay2.add_toast(adw::Toast::new(&format!("Could not reach {endpoint}: {err}")));
                    }
                }
                glib::ControlFlow::Continue
            });
        }
    };

    use std::rc::Rc;
    let on_connect: Rc<dyn Fn()> = Rc::new(on_connect);
    {
        let on_connect = on_connect.clone();
        connect_btn.connect_clicked(move |_| (on_connect)());
    }
    {
        let on_connect = on_connect.clone();
        endpoint_entry.connect_activate(move |_| (on_connect)());
    }

    window.present();
}
