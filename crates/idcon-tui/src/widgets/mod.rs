pub mod panel;
pub mod sub_tabs;
