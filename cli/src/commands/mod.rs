mod entries;
mod export;
mod helpers;
mod import;
mod log;
mod stats;
mod summary;
mod variety;

pub(crate) use entries::{cmd_delete, cmd_edit};
pub(crate) use export::{cmd_export_consumption, cmd_export_varieties};
pub(crate) use import::{cmd_import_consumption, cmd_import_varieties};
pub(crate) use log::cmd_log;
pub(crate) use stats::cmd_stats;
pub(crate) use summary::{cmd_history, cmd_summary};
pub(crate) use variety::{
    cmd_variety_add, cmd_variety_delete, cmd_variety_list, cmd_variety_set_caffeine,
};
