use crate::config::{
    ColumnConfig, DataType, FillOnCreate, PluginConfig, RecordLabel, Required, ResourceConfig, ShowIn, UploadPlugin,
};
use crate::hooks::{BlockDemoUsers, HookChain};
use crate::resources::{CONTENT_IMAGE, MAIN_DB, POST};
use crate::settings::Settings;
use std::sync::Arc;

/// Images embedded in post bodies by the rich editor.
pub fn resource(settings: &Settings) -> ResourceConfig {
    let mut r = ResourceConfig::new(
        CONTENT_IMAGE,
        "contentImage",
        MAIN_DB,
        "Content Images",
        RecordLabel::new("🖼️", "img"),
    );
    r.columns = vec![
        ColumnConfig::new("id", DataType::String)
            .primary_key()
            .fill_on_create(FillOnCreate::Uuid)
            .show_in(&[ShowIn::List, ShowIn::Filter, ShowIn::Show]),
        ColumnConfig::new("createdAt", DataType::DateTime)
            .fill_on_create(FillOnCreate::Now)
            .show_in(&[ShowIn::List, ShowIn::Filter, ShowIn::Show]),
        ColumnConfig::new("img", DataType::String).required(Required::Always),
        ColumnConfig::new("postId", DataType::String)
            .foreign_resource(POST)
            .show_in(&[ShowIn::List, ShowIn::Filter, ShowIn::Show]),
        ColumnConfig::new("resourceId", DataType::String),
    ];

    let block = HookChain::new().then(Arc::new(BlockDemoUsers::default()));
    r.hooks.create = block.clone();
    r.hooks.edit = block.clone();
    r.hooks.delete = block;

    r.plugins = vec![PluginConfig::Upload(UploadPlugin::new(
        "img",
        settings.storage(),
        settings.credentials(),
        "post-content",
    ))];
    r
}
