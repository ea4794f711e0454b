pub mod picker_panel;
pub mod status_bar;
