/// A formatted message ready for the delivery sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub url: String,
    pub color: u32,
    pub body: String,
    pub footer_text: String,
    pub footer_icon: String,
    pub thumbnail: Option<String>,
}
