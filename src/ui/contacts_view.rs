use std::cell::RefCell;
use std::rc::Rc;

use adw::prelude::*;
use gtk4 as gtk;

use crate::api::models::Contact;
use crate::api::ApiClient;
use crate::state::ContactsState;
use crate::ui::toast;

pub struct ContactsView {
    root: gtk::Box,
    list: gtk::ListBox,
    state: RefCell<ContactsState>,
    api: ApiClient,
    overlay: adw::ToastOverlay,
}

impl ContactsView {
    pub fn new(api: ApiClient, overlay: adw::ToastOverlay) -> Rc<Self> {
        let root = gtk::Box::new(gtk::Orientation::Vertical, 8);
        root.set_margin_top(12);
        root.set_margin_bottom(12);
        root.set_margin_start(12);
        root.set_margin_end(12);

        let title = gtk::Label::new(Some("Manage Contacts"));
        title.add_css_class("title-2");
        root.append(&title);

        let search = gtk::SearchEntry::new();
        search.set_placeholder_text(Some("Search contacts..."));
        search.set_halign(gtk::Align::Center);
        search.set_width_chars(40);
        root.append(&search);

        let scroller = gtk::ScrolledWindow::builder()
            .vexpand(true)
            .hexpand(true)
            .build();
        let list = gtk::ListBox::new();
        list.set_selection_mode(gtk::SelectionMode::None);
        list.add_css_class("boxed-list");
        scroller.set_child(Some(&list));
        root.append(&scroller);

        let view = Rc::new(Self {
            root,
            list,
            state: RefCell::new(ContactsState::new()),
            api,
            overlay,
        });

        let weak = Rc::downgrade(&view);
        search.connect_search_changed(move |entry| {
            if let Some(view) = weak.upgrade() {
                view.state.borrow_mut().set_search(&entry.text());
                view.render();
            }
        });

        view
    }

    pub fn widget(&self) -> gtk::Widget {
        self.root.clone().upcast()
    }

    pub fn load(self: &Rc<Self>) {
        let api = self.api.clone();
        let rx = crate::utils::run_async_to_main(async move { api.contacts().await });
        let view = self.clone();
        rx.attach(None, move |res| {
            let notice = view.state.borrow_mut().apply_load(res);
            if let Some(notice) = notice {
                toast(&view.overlay, &notice);
            }
            view.render();
            glib::ControlFlow::Continue
        });
    }

    fn delete(self: &Rc<Self>, id: String) {
        let api = self.api.clone();
        let id_for_async = id.clone();
        let rx = crate::utils::run_async_to_main(async move { api.delete_contact(&id_for_async).await });
        let view = self.clone();
        rx.attach(None, move |res| {
            let notice = view.state.borrow_mut().apply_delete(&id, res);
            toast(&view.overlay, &notice);
            view.render();
            glib::ControlFlow::Continue
        });
    }

    fn render(self: &Rc<Self>) {
        while let Some(child) = self.list.first_child() {
            self.list.remove(&child);
        }
        let rows: Vec<(Contact, String, bool)> = {
            let state = self.state.borrow();
            state
                .visible()
                .into_iter()
                .map(|c| (c.clone(), state.message_for(c).into_owned(), state.is_expanded(&c.id)))
                .collect()
        };
        if rows.is_empty() {
            let empty = gtk::Label::new(Some("No contacts found"));
            empty.add_css_class("dim-label");
            empty.set_margin_top(24);
            empty.set_margin_bottom(24);
            self.list.append(&empty);
            return;
        }
        for (contact, message, expanded) in rows {
            let row = self.contact_row(&contact, &message, expanded);
            self.list.append(&row);
        }
    }

    fn contact_row(self: &Rc<Self>, contact: &Contact, message: &str, expanded: bool) -> gtk::Box {
        let row = gtk::Box::new(gtk::Orientation::Vertical, 4);
        row.set_margin_top(8);
        row.set_margin_bottom(8);
        row.set_margin_start(12);
        row.set_margin_end(12);

        let top = gtk::Box::new(gtk::Orientation::Horizontal, 12);
        let name = gtk::Label::new(Some(&contact.name));
        name.add_css_class("heading");
        name.set_halign(gtk::Align::Start);
        top.append(&name);

        let email = gtk::LinkButton::with_label(&format!("mailto:{}", contact.email), &contact.email);
        top.append(&email);

        let spacer = gtk::Box::new(gtk::Orientation::Horizontal, 0);
        spacer.set_hexpand(true);
        top.append(&spacer);

        let delete_btn = gtk::Button::with_label("Delete");
        delete_btn.add_css_class("destructive-action");
        {
            let weak = Rc::downgrade(self);
            let id = contact.id.clone();
            delete_btn.connect_clicked(move |_| {
                if let Some(view) = weak.upgrade() {
                    view.delete(id.clone());
                }
            });
        }
        top.append(&delete_btn);
        row.append(&top);

        let details = gtk::Label::new(Some(&format!(
            "Phone: {}   Service: {}   Subject: {}",
            contact.phone, contact.service, contact.subject
        )));
        details.set_halign(gtk::Align::Start);
        details.set_wrap(true);
        row.append(&details);

        let message_label = gtk::Label::new(Some(message));
        message_label.set_halign(gtk::Align::Start);
        message_label.set_wrap(true);
        message_label.set_selectable(true);
        row.append(&message_label);

        let toggle = gtk::Button::with_label(if expanded { "See Less" } else { "See More" });
        toggle.add_css_class("flat");
        toggle.set_halign(gtk::Align::Start);
        {
            let weak = Rc::downgrade(self);
            let id = contact.id.clone();
            toggle.connect_clicked(move |_| {
                let Some(view) = weak.upgrade() else { return };
                view.state.borrow_mut().toggle_expand(&id);
                view.render();
            });
        }
        row.append(&toggle);

        if !contact.web.is_empty() {
            let web = gtk::LinkButton::with_label(&format!("https://{}", contact.web), &contact.web);
            web.set_halign(gtk::Align::Start);
            row.append(&web);
        }

        row
    }
}
