use std::fmt::{self, Display, Formatter};

use super::{Fragment, Placement, Rendered};
use crate::view::TodoView;

const HTMX_SRC: &str = "https://unpkg.com/htmx.org@1.9.12";
const TODOMVC_CSS: &str = "https://unpkg.com/todomvc-app-css@2.4.3/index.css";

/// Full document for one of the filter pages. The regions inside are the
/// same fragments the partial endpoints return.
pub fn render_page(view: &TodoView) -> String {
    Page(view).to_string()
}

struct Page<'a>(&'a TodoView);

impl Display for Page<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let view = self.0;
        f.write_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n")?;
        f.write_str("<meta charset=\"utf-8\">\n<title>TodoMPA</title>\n")?;
        writeln!(f, r#"<link rel="stylesheet" href="{TODOMVC_CSS}">"#)?;
        writeln!(f, r#"<script src="{HTMX_SRC}"></script>"#)?;
        f.write_str("</head>\n<body>\n<section class=\"todoapp\">\n")?;

        f.write_str("<header class=\"header\">\n<h1>todos</h1>\n")?;
        f.write_str(concat!(
            r##"<form hx-post="/todos" hx-target="#todo-list" hx-swap="beforeend" hx-on::after-request="this.reset()">"##,
            r#"<input class="new-todo" name="todo" placeholder="What needs to be done?" autocomplete="off" autofocus>"#,
            "</form>\n</header>\n",
        ))?;

        for fragment in [Fragment::Main(view), Fragment::Footer(view)] {
            writeln!(
                f,
                "{}",
                Rendered {
                    fragment,
                    placement: Placement::Primary,
                }
            )?;
        }
        f.write_str("</section>\n</body>\n</html>\n")
    }
}
