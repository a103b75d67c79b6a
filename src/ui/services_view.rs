use std::cell::RefCell;
use std::convert::Infallible;
use std::rc::Rc;

use adw::prelude::*;
use gtk4 as gtk;

use crate::api::models::{ImageRef, ItemField, Section, SectionItem, Service, TechStack};
use crate::api::ApiClient;
use crate::state::services::SUBTITLE_PREVIEW_LIMIT;
use crate::state::{Notice, ServicesState};
use crate::ui::{choose_image, clear_box, confirm, image_preview, toast};
use crate::utils::truncate;

const PREVIEW_SIZE: i32 = 96;
const LOGO_SIZE: i32 = 24;

/// The service form on top, the saved services below.
pub struct ServicesView {
    root: gtk::Stack,
    heading: gtk::Label,
    add_another: gtk::Button,
    title_entry: gtk::Entry,
    subtitle_entry: gtk::Entry,
    main_image_label: gtk::Label,
    main_image_slot: gtk::Box,
    sections: gtk::Box,
    catalog: gtk::FlowBox,
    staged: gtk::Box,
    submit_btn: gtk::Button,
    list_heading: gtk::Label,
    list: gtk::Box,
    state: RefCell<ServicesState>,
    api: ApiClient,
    overlay: adw::ToastOverlay,
    window: gtk::Window,
}

fn field_label(text: &str) -> gtk::Label {
    let label = gtk::Label::new(Some(text));
    label.set_halign(gtk::Align::Start);
    label.add_css_class("dim-label");
    label
}

impl ServicesView {
    pub fn new(api: ApiClient, overlay: adw::ToastOverlay, window: gtk::Window) -> Rc<Self> {
        let root = gtk::Stack::new();

        let spinner = gtk::Spinner::new();
        spinner.set_spinning(true);
        spinner.set_size_request(48, 48);
        spinner.set_halign(gtk::Align::Center);
        spinner.set_valign(gtk::Align::Center);
        root.add_named(&spinner, Some("loading"));

        let page = gtk::Box::new(gtk::Orientation::Vertical, 12);
        page.set_margin_top(12);
        page.set_margin_bottom(24);
        page.set_margin_start(12);
        page.set_margin_end(12);

        let add_another = gtk::Button::with_label("Add Another");
        add_another.set_halign(gtk::Align::Center);
        page.append(&add_another);

        let heading = gtk::Label::new(Some("Add Service"));
        heading.add_css_class("title-2");
        page.append(&heading);

        let form = gtk::Box::new(gtk::Orientation::Vertical, 8);
        form.add_css_class("card");
        form.set_margin_start(6);
        form.set_margin_end(6);

        form.append(&field_label("Title"));
        let title_entry = gtk::Entry::new();
        form.append(&title_entry);

        form.append(&field_label("Subtitle"));
        let subtitle_entry = gtk::Entry::new();
        form.append(&subtitle_entry);

        form.append(&field_label("Main Service Image"));
        let main_image_row = gtk::Box::new(gtk::Orientation::Horizontal, 8);
        let main_image_label = gtk::Label::new(None);
        main_image_label.set_hexpand(true);
        main_image_label.set_halign(gtk::Align::Start);
        main_image_label.set_ellipsize(gtk::pango::EllipsizeMode::Middle);
        let main_image_btn = gtk::Button::with_label("Choose…");
        main_image_row.append(&main_image_label);
        main_image_row.append(&main_image_btn);
        form.append(&main_image_row);
        let main_image_slot = gtk::Box::new(gtk::Orientation::Horizontal, 0);
        form.append(&main_image_slot);

        let sections = gtk::Box::new(gtk::Orientation::Vertical, 12);
        form.append(&sections);

        let stacks_title = gtk::Label::new(Some("Tech Stacks"));
        stacks_title.add_css_class("heading");
        stacks_title.set_halign(gtk::Align::Start);
        form.append(&stacks_title);
        let catalog = gtk::FlowBox::new();
        catalog.set_selection_mode(gtk::SelectionMode::None);
        catalog.set_max_children_per_line(6);
        form.append(&catalog);

        let staged_title = gtk::Label::new(Some("Selected Tech Stacks:"));
        staged_title.add_css_class("heading");
        staged_title.set_halign(gtk::Align::Start);
        form.append(&staged_title);
        let staged = gtk::Box::new(gtk::Orientation::Horizontal, 6);
        form.append(&staged);

        let submit_btn = gtk::Button::with_label("Add Service");
        submit_btn.add_css_class("suggested-action");
        submit_btn.set_margin_top(12);
        form.append(&submit_btn);

        let clamp = adw::Clamp::builder().maximum_size(760).child(&form).build();
        page.append(&clamp);

        let list_heading = gtk::Label::new(None);
        list_heading.add_css_class("title-3");
        list_heading.set_halign(gtk::Align::Start);
        list_heading.set_margin_top(24);
        page.append(&list_heading);
        let list = gtk::Box::new(gtk::Orientation::Vertical, 8);
        page.append(&list);

        let scroller = gtk::ScrolledWindow::builder()
            .vexpand(true)
            .hexpand(true)
            .child(&page)
            .build();
        root.add_named(&scroller, Some("content"));

        let view = Rc::new(Self {
            root,
            heading,
            add_another,
            title_entry,
            subtitle_entry,
            main_image_label,
            main_image_slot,
            sections,
            catalog,
            staged,
            submit_btn,
            list_heading,
            list,
            state: RefCell::new(ServicesState::new()),
            api,
            overlay,
            window,
        });

        {
            let weak = Rc::downgrade(&view);
            view.title_entry.connect_changed(move |e| {
                if let Some(view) = weak.upgrade() {
                    view.state.borrow_mut().set_title(&e.text());
                }
            });
        }
        {
            let weak = Rc::downgrade(&view);
            view.subtitle_entry.connect_changed(move |e| {
                if let Some(view) = weak.upgrade() {
                    view.state.borrow_mut().set_subtitle(&e.text());
                }
            });
        }
        {
            let weak = Rc::downgrade(&view);
            main_image_btn.connect_clicked(move |_| {
                let Some(view) = weak.upgrade() else { return };
                let weak = weak.clone();
                choose_image(&view.window, move |path| {
                    if let Some(view) = weak.upgrade() {
                        view.state.borrow_mut().set_main_image(path);
                        view.render_form();
                    }
                });
            });
        }
        {
            let weak = Rc::downgrade(&view);
            view.add_another.connect_clicked(move |_| {
                if let Some(view) = weak.upgrade() {
                    view.state.borrow_mut().reset_form();
                    view.render_all();
                }
            });
        }
        {
            let weak = Rc::downgrade(&view);
            view.submit_btn.connect_clicked(move |_| {
                if let Some(view) = weak.upgrade() {
                    view.submit();
                }
            });
        }

        view.render_all();
        view
    }

    pub fn widget(&self) -> gtk::Widget {
        self.root.clone().upcast()
    }

    /// Refetch services and the tech-stack catalog; the spinner covers the page
    /// until every outstanding load has finished.
    pub fn load(self: &Rc<Self>) {
        self.state.borrow_mut().begin_load();
        self.render_loading();
        let api = self.api.clone();
        let rx = crate::utils::run_async_to_main(async move {
            let (services, stacks) = tokio::join!(api.services(), api.tech_stacks());
            Ok::<_, Infallible>((services, stacks))
        });
        let view = self.clone();
        rx.attach(None, move |res| {
            let (services, stacks) = match res {
                Ok(pair) => pair,
                Err(never) => match never {},
            };
            let notice = view.state.borrow_mut().apply_load(services, stacks);
            if let Some(notice) = notice {
                toast(&view.overlay, &notice);
            }
            view.render_all();
            glib::ControlFlow::Continue
        });
    }

    fn submit(self: &Rc<Self>) {
        let missing = self.state.borrow().missing_required();
        if let Some(field) = missing {
            toast(&self.overlay, &Notice::error(format!("{field} is required")));
            return;
        }
        let begun = self.state.borrow_mut().begin_submit();
        let request = match begun {
            Ok(request) => request,
            Err(notice) => {
                toast(&self.overlay, &notice);
                return;
            }
        };
        let target = request.target.clone();
        self.render_loading();

        let api = self.api.clone();
        let rx = crate::utils::run_async_to_main(async move { request.send(&api).await });
        let view = self.clone();
        rx.attach(None, move |res| {
            let notice = view.state.borrow_mut().finish_submit(&target, res);
            toast(&view.overlay, &notice);
            if notice.is_error() {
                view.render_all();
            } else {
                view.load();
            }
            glib::ControlFlow::Continue
        });
    }

    fn edit(self: &Rc<Self>, service: &Service) {
        self.state.borrow_mut().edit_service(service);
        self.render_all();
    }

    fn delete(self: &Rc<Self>, service: &Service) {
        let Some(id) = service.id.clone() else {
            toast(&self.overlay, &Notice::error("Service has not been saved yet"));
            return;
        };
        let title = service.title.clone();
        let view = self.clone();
        confirm(
            &self.window,
            "Are you sure?",
            &ServicesState::delete_prompt(service),
            "Yes, delete it!",
            move || {
                let api = view.api.clone();
                let id_for_async = id.clone();
                let rx = crate::utils::run_async_to_main(async move { api.delete_service(&id_for_async).await });
                let view = view.clone();
                let id = id.clone();
                let title = title.clone();
                rx.attach(None, move |res| {
                    let notice = view.state.borrow_mut().apply_delete(&id, &title, res);
                    toast(&view.overlay, &notice);
                    view.render_all();
                    glib::ControlFlow::Continue
                });
            },
        );
    }

    /// Covers the page while a load or a save is outstanding.
    fn render_loading(&self) {
        let busy = self.state.borrow().is_busy();
        self.root.set_visible_child_name(if busy { "loading" } else { "content" });
    }

    fn render_all(self: &Rc<Self>) {
        self.render_loading();
        self.render_form();
        self.render_tech();
        self.render_list();
    }

    fn render_form(self: &Rc<Self>) {
        let draft = self.state.borrow().draft().clone();
        let editing = draft.id.is_some();

        self.add_another.set_visible(editing);
        self.heading.set_label(if editing { "Update Service" } else { "Add Service" });
        self.submit_btn.set_label(if editing { "Update Service" } else { "Add Service" });

        if self.title_entry.text() != draft.title {
            self.title_entry.set_text(&draft.title);
        }
        if self.subtitle_entry.text() != draft.subtitle {
            self.subtitle_entry.set_text(&draft.subtitle);
        }
        self.main_image_label.set_label(&draft.main_service_image.label());
        clear_box(&self.main_image_slot);
        self.main_image_slot
            .append(&image_preview(&self.api, &draft.main_service_image, PREVIEW_SIZE));

        clear_box(&self.sections);
        for section in Section::ALL {
            let group = self.section_group(section, draft.section(section));
            self.sections.append(&group);
        }
    }

    fn section_group(self: &Rc<Self>, section: Section, items: &[SectionItem]) -> gtk::Box {
        let group = gtk::Box::new(gtk::Orientation::Vertical, 6);
        let title = gtk::Label::new(Some(section.heading()));
        title.add_css_class("heading");
        title.set_halign(gtk::Align::Start);
        group.append(&title);

        for (index, item) in items.iter().enumerate() {
            group.append(&self.item_frame(section, index, item));
        }

        let add_btn = gtk::Button::with_label("+");
        add_btn.set_halign(gtk::Align::Start);
        add_btn.set_tooltip_text(Some(&format!("Add {} item", section.as_str())));
        {
            let weak = Rc::downgrade(self);
            add_btn.connect_clicked(move |_| {
                let Some(view) = weak.upgrade() else { return };
                view.state.borrow_mut().add_item(section);
                view.render_form();
            });
        }
        group.append(&add_btn);
        group
    }

    fn item_frame(self: &Rc<Self>, section: Section, index: usize, item: &SectionItem) -> gtk::Frame {
        let frame = gtk::Frame::new(None);
        let body = gtk::Box::new(gtk::Orientation::Vertical, 4);
        body.set_margin_top(8);
        body.set_margin_bottom(8);
        body.set_margin_start(8);
        body.set_margin_end(8);

        let title_row = gtk::Box::new(gtk::Orientation::Horizontal, 6);
        let title_entry = gtk::Entry::new();
        title_entry.set_placeholder_text(Some("Title"));
        title_entry.set_hexpand(true);
        title_entry.set_text(&item.title);
        {
            let weak = Rc::downgrade(self);
            title_entry.connect_changed(move |e| {
                if let Some(view) = weak.upgrade() {
                    view.state
                        .borrow_mut()
                        .set_item_field(section, index, ItemField::Title, &e.text());
                }
            });
        }
        let remove_btn = gtk::Button::from_icon_name("user-trash-symbolic");
        remove_btn.add_css_class("destructive-action");
        remove_btn.set_tooltip_text(Some("Remove item"));
        {
            let weak = Rc::downgrade(self);
            remove_btn.connect_clicked(move |_| {
                let Some(view) = weak.upgrade() else { return };
                view.state.borrow_mut().remove_item(section, index);
                view.render_form();
            });
        }
        title_row.append(&title_entry);
        title_row.append(&remove_btn);
        body.append(&field_label("Title"));
        body.append(&title_row);

        body.append(&field_label("Description"));
        let description = gtk::TextView::new();
        description.set_wrap_mode(gtk::WrapMode::WordChar);
        description.set_height_request(72);
        let buffer = description.buffer();
        buffer.set_text(&item.description);
        {
            let weak = Rc::downgrade(self);
            buffer.connect_changed(move |b| {
                let Some(view) = weak.upgrade() else { return };
                let text = b.text(&b.start_iter(), &b.end_iter(), false);
                view.state
                    .borrow_mut()
                    .set_item_field(section, index, ItemField::Description, &text);
            });
        }
        body.append(&description);

        body.append(&field_label("Image"));
        let image_row = gtk::Box::new(gtk::Orientation::Horizontal, 6);
        let image_label = gtk::Label::new(Some(&item.image.label()));
        image_label.set_hexpand(true);
        image_label.set_halign(gtk::Align::Start);
        image_label.set_ellipsize(gtk::pango::EllipsizeMode::Middle);
        let image_btn = gtk::Button::with_label("Choose…");
        {
            let weak = Rc::downgrade(self);
            image_btn.connect_clicked(move |_| {
                let Some(view) = weak.upgrade() else { return };
                let weak = weak.clone();
                choose_image(&view.window, move |path| {
                    if let Some(view) = weak.upgrade() {
                        view.state.borrow_mut().set_item_image(section, index, path);
                        view.render_form();
                    }
                });
            });
        }
        image_row.append(&image_label);
        image_row.append(&image_btn);
        body.append(&image_row);
        body.append(&image_preview(&self.api, &item.image, PREVIEW_SIZE));

        frame.set_child(Some(&body));
        frame
    }

    fn render_tech(self: &Rc<Self>) {
        let (catalog, staged): (Vec<TechStack>, Vec<TechStack>) = {
            let state = self.state.borrow();
            (state.catalog().to_vec(), state.staged().to_vec())
        };

        while let Some(child) = self.catalog.first_child() {
            self.catalog.remove(&child);
        }
        for stack in catalog {
            let chip = gtk::Box::new(gtk::Orientation::Horizontal, 6);
            chip.append(&self.logo(&stack));
            chip.append(&gtk::Label::new(Some(&stack.title)));
            let add_btn = gtk::Button::with_label("Add");
            add_btn.add_css_class("flat");
            {
                let weak = Rc::downgrade(self);
                add_btn.connect_clicked(move |_| {
                    let Some(view) = weak.upgrade() else { return };
                    let notice = view.state.borrow_mut().select_tech_stack(&stack);
                    toast(&view.overlay, &notice);
                    view.render_tech();
                });
            }
            chip.append(&add_btn);
            self.catalog.insert(&chip, -1);
        }

        clear_box(&self.staged);
        if staged.is_empty() {
            self.staged.append(&field_label("No techstack selected."));
        }
        for stack in staged {
            let chip = gtk::Box::new(gtk::Orientation::Horizontal, 4);
            chip.add_css_class("card");
            chip.append(&self.logo(&stack));
            chip.append(&gtk::Label::new(Some(&stack.title)));
            let remove_btn = gtk::Button::from_icon_name("window-close-symbolic");
            remove_btn.add_css_class("flat");
            {
                let weak = Rc::downgrade(self);
                let id = stack.id.clone();
                remove_btn.connect_clicked(move |_| {
                    let Some(view) = weak.upgrade() else { return };
                    view.state.borrow_mut().deselect_tech_stack(&id);
                    view.render_tech();
                });
            }
            chip.append(&remove_btn);
            self.staged.append(&chip);
        }
    }

    fn logo(&self, stack: &TechStack) -> gtk::Picture {
        let image = ImageRef::from(Some(stack.image.clone()));
        image_preview(&self.api, &image, LOGO_SIZE)
    }

    fn render_list(self: &Rc<Self>) {
        let services = self.state.borrow().services().to_vec();
        self.list_heading.set_label(if services.is_empty() { "no services found" } else { "Explore Services" });

        clear_box(&self.list);
        for service in services {
            let card = gtk::Box::new(gtk::Orientation::Horizontal, 12);
            card.add_css_class("card");
            let thumb = image_preview(&self.api, &service.main_service_image, PREVIEW_SIZE / 2);
            thumb.set_margin_start(12);
            card.append(&thumb);

            let text = gtk::Box::new(gtk::Orientation::Vertical, 2);
            text.set_hexpand(true);
            text.set_margin_top(8);
            text.set_margin_bottom(8);
            text.set_margin_start(12);
            let title = gtk::Label::new(Some(&service.title));
            title.add_css_class("heading");
            title.set_halign(gtk::Align::Start);
            let subtitle = gtk::Label::new(Some(&truncate(&service.subtitle, SUBTITLE_PREVIEW_LIMIT)));
            subtitle.set_halign(gtk::Align::Start);
            text.append(&title);
            text.append(&subtitle);
            card.append(&text);

            let edit_btn = gtk::Button::from_icon_name("document-edit-symbolic");
            edit_btn.set_tooltip_text(Some("Edit"));
            edit_btn.set_valign(gtk::Align::Center);
            let delete_btn = gtk::Button::from_icon_name("user-trash-symbolic");
            delete_btn.set_tooltip_text(Some("Delete"));
            delete_btn.add_css_class("destructive-action");
            delete_btn.set_valign(gtk::Align::Center);
            delete_btn.set_margin_end(12);
            {
                let weak = Rc::downgrade(self);
                let service = service.clone();
                edit_btn.connect_clicked(move |_| {
                    if let Some(view) = weak.upgrade() {
                        view.edit(&service);
                    }
                });
            }
            {
                let weak = Rc::downgrade(self);
                delete_btn.connect_clicked(move |_| {
                    if let Some(view) = weak.upgrade() {
                        view.delete(&service);
                    }
                });
            }
            card.append(&edit_btn);
            card.append(&delete_btn);
            self.list.append(&card);
        }
    }
}
