pub mod controls;
pub mod search_box;
pub mod station_list;
pub mod support_modal;
