pub mod picker;
pub mod templates;

pub use picker::PickerComponent;
pub use templates::TemplateComponent;
