use crate::config::{
    ColumnConfig, ColumnValidator, DataType, EditingNote, FillOnCreate, ImageGeneration, PluginConfig, RateLimitPolicy,
    RecordLabel, Required, ResourceConfig, ShowIn, UploadPlugin,
};
use crate::hooks::{BlockDemoUsers, HashPassword, HookChain};
use crate::resources::{MAIN_DB, USER};
use crate::settings::Settings;
use std::sync::Arc;

/// Admin users. Passwords arrive in the virtual `password` column and are stored hashed.
pub fn resource(settings: &Settings) -> ResourceConfig {
    let mut r = ResourceConfig::new(USER, "user", MAIN_DB, "Users", RecordLabel::new("👤", "email"));
    r.columns = vec![
        ColumnConfig::new("id", DataType::String)
            .primary_key()
            .fill_on_create(FillOnCreate::Uuid)
            .show_in(&[ShowIn::List, ShowIn::Filter, ShowIn::Show]),
        ColumnConfig::new("email", DataType::String)
            .required(Required::Always)
            .unique()
            .enforce_lower_case()
            .validator(ColumnValidator::email()),
        ColumnConfig::new("createdAt", DataType::DateTime)
            .fill_on_create(FillOnCreate::Now)
            .show_in(&[ShowIn::List, ShowIn::Filter, ShowIn::Show]),
        ColumnConfig::new("password", DataType::String)
            .virtual_column()
            .required(Required::OnCreate)
            .masked()
            .show_in(&[ShowIn::Create, ShowIn::Edit])
            .editing_note(EditingNote {
                create: None,
                edit: Some("Leave empty to keep password unchanged".into()),
            }),
        ColumnConfig::new("passwordHash", DataType::String)
            .backend_only()
            .show_in(&[]),
        ColumnConfig::new("publicName", DataType::String),
        ColumnConfig::new("avatar", DataType::String),
    ];

    let write = HookChain::new()
        .then(Arc::new(BlockDemoUsers::default()))
        .then(Arc::new(HashPassword::default()));
    r.hooks.create = write.clone();
    r.hooks.edit = write;
    r.hooks.delete = HookChain::new().then(Arc::new(BlockDemoUsers::default()));

    r.plugins = vec![PluginConfig::Upload(
        UploadPlugin::new("avatar", settings.storage(), settings.credentials(), "user-avatars")
        .with_generation(ImageGeneration {
            provider: "openai-dall-e".into(),
            count_to_generate: 2,
            model: "dall-e-3".into(),
            size: "1024x1024".into(),
            api_key: settings.openai_api_key.clone(),
            fields_for_context: Vec::new(),
            rate_limit: Some(
                RateLimitPolicy::new("5/2d")
                    .with_message("For demo purposes, you can only generate 10 images per 2 days."),
            ),
        }),
    )];
    r
}
