pub mod analysis_view;
pub mod camera_view;
pub mod header;
pub mod history_list;
pub mod loader;
pub mod nav;
pub mod notice;
pub mod settings_panel;
pub mod upload_area;
