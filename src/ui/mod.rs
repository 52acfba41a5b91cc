/// UI layer: top bar, side panel, and the three central views.
pub mod panels;
pub mod plot;
pub mod tables;
