use std::cell::RefCell;
use std::rc::Rc;

use adw::prelude::*;
use adw::Application;
use log::error;

use crate::app::Settings;
use crate::ui::contacts_view::ContactsView;
use crate::ui::services_view::ServicesView;

pub fn show_main_window(app: &Application, settings: Settings) {
    let api = match settings.client() {
        Ok(api) => api,
        Err(e) => {
            error!("Stored endpoint is unusable: {e}");
            crate::ui::setup::show_setup_window(app);
            return;
        }
    };

    let window = adw::ApplicationWindow::builder()
        .application(app)
        .title("Nexile Admin")
        .default_width(1100)
        .default_height(760)
        .build();

    let overlay = adw::ToastOverlay::new();
    let stack = adw::ViewStack::new();

    let contacts = ContactsView::new(api.clone(), overlay.clone());
    let services = ServicesView::new(api, overlay.clone(), window.clone().upcast());
    stack.add_titled(&contacts.widget(), Some("contacts"), "Contacts");
    stack.add_titled(&services.widget(), Some("services"), "Services");
    overlay.set_child(Some(&stack));

    let container = gtk4::Box::new(gtk4::Orientation::Vertical, 0);
    let header = adw::HeaderBar::new();
    let switcher = adw::ViewSwitcher::builder()
        .stack(&stack)
        .policy(adw::ViewSwitcherPolicy::Wide)
        .build();
    header.set_title_widget(Some(&switcher));

    let endpoint_btn = gtk4::Button::with_label("Endpoint");
    endpoint_btn.set_tooltip_text(Some(settings.endpoint.as_str()));
    header.pack_end(&endpoint_btn);

    let refresh_btn = gtk4::Button::from_icon_name("view-refresh-symbolic");
    refresh_btn.set_tooltip_text(Some("Reload"));
    header.pack_start(&refresh_btn);

    container.append(&header);
    container.append(&overlay);
    window.set_content(Some(&container));
    window.present();

    contacts.load();
    services.load();

    // The views hold the window, so the window's handlers own them only until it closes.
    let views = Rc::new(RefCell::new(Some((contacts, services))));
    {
        let views = views.clone();
        refresh_btn.connect_clicked(move |_| {
            if let Some((contacts, services)) = views.borrow().as_ref() {
                contacts.load();
                services.load();
            }
        });
    }
    window.connect_close_request(move |_| {
        views.borrow_mut().take();
        gtk4::glib::Propagation::Proceed
    });
    {
        let app = app.clone();
        let window = window.clone();
        endpoint_btn.connect_clicked(move |_| {
            crate::ui::setup::show_setup_window(&app);
            window.close();
        });
    }
}
