use anyhow::Context as _;
use tera::{Context, Tera};

use crate::todos::repo_types::Todo;

const LIST_PAGE: &str = "index.html";
const EDIT_PAGE: &str = "update.html";

/// Compiled HTML views. Built once at startup and shared through `AppState`.
pub struct Templates {
    tera: Tera,
}

impl Templates {
    pub fn new() -> anyhow::Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            ("base.html", include_str!("../templates/base.html")),
            (LIST_PAGE, include_str!("../templates/index.html")),
            (EDIT_PAGE, include_str!("../templates/update.html")),
        ])
        .context("compile templates")?;
        Ok(Self { tera })
    }

    pub fn render_list(&self, todos: &[Todo]) -> tera::Result<String> {
        let mut ctx = Context::new();
        ctx.insert("todos", todos);
        self.tera.render(LIST_PAGE, &ctx)
    }

    pub fn render_edit(&self, todo: &Todo) -> tera::Result<String> {
        let mut ctx = Context::new();
        ctx.insert("todo", todo);
        self.tera.render(EDIT_PAGE, &ctx)
    }
}
