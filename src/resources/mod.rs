//! The blog's admin panel: users, posts and the images embedded in posts.

mod content_image;
mod post;
mod user;

use crate::config::{
    AdminPanel, Announcement, AuthConfig, Customization, DataSourceConfig, DemoCredentials, MenuItem, SidebarColors,
};
use crate::error::ConfigError;
use crate::settings::Settings;

pub const MAIN_DB: &str = "maindb";
pub const USER: &str = "user";
pub const POST: &str = "post";
pub const CONTENT_IMAGE: &str = "contentImage";

const ANNOUNCEMENT_HTML: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" style="display:inline; margin-top: -4px" width="16" height="16" viewBox="0 0 24 24"><path d="M12 .587l3.668 7.568 8.332 1.151-6.064 5.828 1.48 8.279-7.416-3.967-7.417 3.967 1.481-8.279-6.064-5.828 8.332-1.151z"/></svg> <a href="https://github.com/devforth/adminforth" style="font-weight: bold; text-decoration: underline" target="_blank">Star us on GitHub</a> to support a project!"#;

/// Build and validate the full panel from settings.
pub fn panel(settings: &Settings) -> Result<AdminPanel, ConfigError> {
    let auth = AuthConfig {
        users_resource_id: USER.into(),
        username_column: "email".into(),
        password_hash_column: "passwordHash".into(),
        demo_credentials: Some(DemoCredentials {
            username: "demo@adminforth.dev".into(),
            password: "demo".into(),
        }),
        login_prompt_html: Some(
            "Use email <b>demo@adminforth.dev</b> and password <b>demo</b> to login".into(),
        ),
    };
    let customization = Customization {
        brand_name: "My Admin".into(),
        dates_format: "D MMM".into(),
        time_format: "HH:mm".into(),
        empty_field_placeholder: "-".into(),
        primary_color: "rgb(47 37 227)".into(),
        sidebar: SidebarColors {
            main: "#EFF5F7".into(),
            text: "#333".into(),
        },
        announcement: Some(Announcement {
            html: ANNOUNCEMENT_HTML.into(),
            closable: true,
        }),
    };
    let menu = vec![
        MenuItem::Resource {
            label: "Posts".into(),
            icon: "flowbite:home-solid".into(),
            resource_id: POST.into(),
            homepage: true,
        },
        MenuItem::Gap,
        MenuItem::Divider,
        MenuItem::Heading {
            label: "SYSTEM".into(),
        },
        MenuItem::Resource {
            label: "Users".into(),
            icon: "flowbite:user-solid".into(),
            resource_id: USER.into(),
            homepage: false,
        },
    ];

    AdminPanel::new(
        "/admin",
        auth,
        customization,
        vec![DataSourceConfig {
            id: MAIN_DB.into(),
            url: settings.database_url.clone(),
        }],
        vec![
            user::resource(settings),
            post::resource(settings),
            content_image::resource(settings),
        ],
        menu,
    )
}
