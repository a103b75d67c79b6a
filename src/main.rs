use adw::prelude::*;
use adw::Application;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let app = Application::builder()
        .application_id("digital.nexile.Admin")
        .build();
    app.connect_activate(|app| {
        nexile_admin::app::build_ui(app);
    });
    app.run();
}
