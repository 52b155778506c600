use crate::config::{
    AttachmentConfig, ColumnConfig, CompletionConfig, DataType, FieldCompletionPlugin, FillOnCreate,
    ImageGeneration, PluginConfig, RateLimitPolicy, RecordLabel, Required, ResourceConfig, RichEditorPlugin,
    ShowIn, UploadPlugin,
};
use crate::hooks::{BlockDemoUsers, HookChain, SlugFromTitle};
use crate::resources::{CONTENT_IMAGE, MAIN_DB, POST, USER};
use crate::settings::Settings;
use std::sync::Arc;

pub fn resource(settings: &Settings) -> ResourceConfig {
    let mut r = ResourceConfig::new(POST, "post", MAIN_DB, "Posts", RecordLabel::new("📝", "title"));
    r.columns = vec![
        ColumnConfig::new("id", DataType::String)
            .primary_key()
            .fill_on_create(FillOnCreate::Uuid)
            .show_in(&[ShowIn::Filter, ShowIn::Show]),
        ColumnConfig::new("title", DataType::String)
            .required(Required::Always)
            .length(Some(3), Some(255)),
        ColumnConfig::new("picture", DataType::String),
        ColumnConfig::new("slug", DataType::String).show_in(&[ShowIn::Filter, ShowIn::Show]),
        ColumnConfig::new("content", DataType::RichText)
            .show_in(&[ShowIn::Create, ShowIn::Edit, ShowIn::Filter, ShowIn::Show]),
        ColumnConfig::new("createdAt", DataType::DateTime)
            .fill_on_create(FillOnCreate::Now)
            .show_in(&[ShowIn::List, ShowIn::Filter, ShowIn::Show]),
        ColumnConfig::new("published", DataType::Boolean).required(Required::Always),
        ColumnConfig::new("authorId", DataType::String)
            .foreign_resource(USER)
            .fill_on_create(FillOnCreate::ActorId)
            .show_in(&[ShowIn::Filter, ShowIn::Show]),
    ];

    let write = HookChain::new()
        .then(Arc::new(BlockDemoUsers::default()))
        .then(Arc::new(SlugFromTitle));
    r.hooks.create = write.clone();
    r.hooks.edit = write;
    r.hooks.delete = HookChain::new().then(Arc::new(BlockDemoUsers::default()));

    let completion = || {
        CompletionConfig::openai_chat("gpt-4o", settings.openai_api_key.clone())
            .with_rate_limit(RateLimitPolicy::new("100/1d"))
    };
    r.plugins = vec![
        PluginConfig::Upload(
            UploadPlugin::new("picture", settings.storage(), settings.credentials(), "post-previews")
                .with_generation(ImageGeneration {
                    provider: "openai-dall-e".into(),
                    count_to_generate: 2,
                    model: "dall-e-3".into(),
                    size: "1792x1024".into(),
                    api_key: settings.openai_api_key.clone(),
                    fields_for_context: vec!["title".into()],
                    rate_limit: Some(
                        RateLimitPolicy::new("5/2d")
                            .with_message("For demo purposes, you can only generate 10 images per 2 days."),
                    ),
                }),
        ),
        PluginConfig::RichEditor(RichEditorPlugin {
            html_column: "content".into(),
            completion: Some(completion()),
            attachments: Some(AttachmentConfig {
                resource_id: CONTENT_IMAGE.into(),
                column: "img".into(),
                record_id_column: "postId".into(),
                resource_id_column: "resourceId".into(),
            }),
        }),
        PluginConfig::FieldCompletion(FieldCompletionPlugin {
            column: "title".into(),
            completion: completion(),
        }),
    ];
    r
}
