//! Overlay host used by the single-page variant of the list view

/// Visibility-gated container with a title and arbitrary content
#[derive(Debug, Clone)]
pub struct ModalHost<T> {
    open: bool,
    title: String,
    content: Option<T>,
}

impl<T> Default for ModalHost<T> {
    fn default() -> Self {
        Self {
            open: false,
            title: String::new(),
            content: None,
        }
    }
}

impl<T> ModalHost<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, title: impl Into<String>, content: T) {
        self.open = true;
        self.title = title.into();
        self.content = Some(content);
    }

    /// Close callback; hands back whatever was hosted
    pub fn close(&mut self) -> Option<T> {
        self.open = false;
        self.title.clear();
        self.content.take()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> Option<&T> {
        self.content.as_ref().filter(|_| self.open)
    }

    pub fn content_mut(&mut self) -> Option<&mut T> {
        if self.open {
            self.content.as_mut()
        } else {
            None
        }
    }

    /// Nothing when closed, otherwise a titled frame around `body`
    pub fn render(&self, body: &str) -> Option<String> {
        if !self.open {
            return None;
        }
        let width = body
            .lines()
            .map(|l| l.chars().count())
            .chain(std::iter::once(self.title.chars().count() + 4))
            .max()
            .unwrap_or(0);
        let rule = "-".repeat(width + 4);
        let mut out = String::new();
        out.push_str(&format!("+{}+\n", rule));
        out.push_str(&format!(
            "| {:<w$} [x] |\n",
            self.title,
            w = width.saturating_sub(2)
        ));
        out.push_str(&format!("+{}+\n", rule));
        for line in body.lines() {
            out.push_str(&format!("|  {:<w$}  |\n", line, w = width));
        }
        out.push_str(&format!("+{}+", rule));
        Some(out)
    }
}
