pub mod pane_chrome;
pub mod scrollable_list;
pub mod toast;
