use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use chrono::{DateTime, Datelike, TimeZone, Utc};
use maud::{DOCTYPE, Markup, html};

use crate::{
    csrf::CSRF_FIELD,
    forms::{SnippetCreateForm, UserLoginForm, UserSignupForm},
    models::Snippet,
    validator::{Validated, Validator},
};

/// Helpers available to page markup. Handed to [`Renderer::new`] once at start-up.
#[derive(Clone, Copy)]
pub struct TemplateFuncs {
    pub human_date: fn(Option<&DateTime<Utc>>) -> String,
}

impl Default for TemplateFuncs {
    fn default() -> Self {
        Self {
            human_date: human_date::<Utc>,
        }
    }
}

/// Format a timestamp as `25 Jan 2024 at 17:30`, in UTC. `None` renders empty.
pub fn human_date<Tz: TimeZone>(t: Option<&DateTime<Tz>>) -> String {
    match t {
        Some(t) => t.with_timezone(&Utc).format("%d %b %Y at %H:%M").to_string(),
        None => String::new(),
    }
}

/// Values every page shows, gathered per request.
#[derive(Debug, Clone, Default)]
pub struct TemplateData {
    pub current_year: i32,
    pub flash: Option<String>,
    pub is_authenticated: bool,
    pub csrf_token: String,
}

impl TemplateData {
    pub fn new(flash: Option<String>, is_authenticated: bool, csrf_token: String) -> Self {
        Self {
            current_year: Utc::now().year(),
            flash,
            is_authenticated,
            csrf_token,
        }
    }
}

pub enum Page<'a> {
    Home { snippets: &'a [Snippet] },
    View { snippet: &'a Snippet },
    Create { form: &'a SnippetCreateForm },
    Signup { form: &'a UserSignupForm },
    Login { form: &'a UserLoginForm },
}

impl Page<'_> {
    fn title(&self) -> &'static str {
        match self {
            Page::Home { .. } => "Home",
            Page::View { .. } => "Snippet",
            Page::Create { .. } => "Create a New Snippet",
            Page::Signup { .. } => "Signup",
            Page::Login { .. } => "Login",
        }
    }
}

#[derive(Clone, Default)]
pub struct Renderer {
    funcs: TemplateFuncs,
}

impl Renderer {
    pub fn new(funcs: TemplateFuncs) -> Self {
        Self { funcs }
    }

    pub fn render(&self, status: StatusCode, page: Page<'_>, data: &TemplateData) -> Response {
        (status, Html(self.markup(&page, data).into_string())).into_response()
    }

    fn markup(&self, page: &Page<'_>, data: &TemplateData) -> Markup {
        let content = match page {
            Page::Home { snippets } => self.home(snippets),
            Page::View { snippet } => self.view(snippet),
            Page::Create { form } => create(form, data),
            Page::Signup { form } => signup(form, data),
            Page::Login { form } => login(form, data),
        };
        shell(page.title(), data, content)
    }

    fn home(&self, snippets: &[Snippet]) -> Markup {
        let human_date = self.funcs.human_date;
        html! {
            h2 { "Latest Snippets" }
            @if snippets.is_empty() {
                p { "There's nothing to see here... yet!" }
            } @else {
                table {
                    tr {
                        th { "Title" }
                        th { "Created" }
                        th { "ID" }
                    }
                    @for s in snippets {
                        tr {
                            td { a href={ "/snippet/view/" (s.id) } { (s.title) } }
                            td { (human_date(Some(&s.created))) }
                            td { "#" (s.id) }
                        }
                    }
                }
            }
        }
    }

    fn view(&self, s: &Snippet) -> Markup {
        let human_date = self.funcs.human_date;
        html! {
            div class="snippet" {
                div class="metadata" {
                    strong { (s.title) }
                    span { "#" (s.id) }
                }
                pre { code { (s.content) } }
                div class="metadata" {
                    time { "Created: " (human_date(Some(&s.created))) }
                    time { "Expires: " (human_date(Some(&s.expires))) }
                }
            }
        }
    }
}

fn shell(title: &str, data: &TemplateData, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) " - Snippetbox" }
            }
            body {
                header {
                    h1 { a href="/" { "Snippetbox" } }
                }
                (nav(data))
                main {
                    @if let Some(flash) = &data.flash {
                        div class="flash" { (flash) }
                    }
                    (content)
                }
                footer {
                    "Powered by Rust in " (data.current_year)
                }
            }
        }
    }
}

fn nav(data: &TemplateData) -> Markup {
    html! {
        nav {
            div {
                a href="/" { "Home" }
                @if data.is_authenticated {
                    a href="/snippet/create" { "Create snippet" }
                }
            }
            div {
                @if data.is_authenticated {
                    form action="/user/logout" method="post" {
                        (csrf_input(data))
                        button { "Logout" }
                    }
                } @else {
                    a href="/user/signup" { "Signup" }
                    a href="/user/login" { "Login" }
                }
            }
        }
    }
}

fn csrf_input(data: &TemplateData) -> Markup {
    html! {
        input type="hidden" name=(CSRF_FIELD) value=(data.csrf_token);
    }
}

fn field_error(v: &Validator, field: &str) -> Markup {
    html! {
        @if let Some(msg) = v.field_error(field) {
            label class="error" { (msg) }
        }
    }
}

fn non_field_errors(v: &Validator) -> Markup {
    html! {
        @for msg in v.non_field_errors() {
            div class="error" { (msg) }
        }
    }
}

fn create(form: &SnippetCreateForm, data: &TemplateData) -> Markup {
    let v = form.validator();
    html! {
        form action="/snippet/create" method="post" {
            (csrf_input(data))
            div {
                label for="title" { "Title:" }
                (field_error(v, "title"))
                input type="text" id="title" name="title" value=(form.title);
            }
            div {
                label for="content" { "Content:" }
                (field_error(v, "content"))
                textarea id="content" name="content" { (form.content) }
            }
            div {
                label { "Delete in:" }
                (field_error(v, "expires"))
                @for (days, label) in [(365, "One Year"), (7, "One Week"), (1, "One Day")] {
                    input type="radio" name="expires" value=(days) checked[form.expires == days];
                    " " (label) " "
                }
            }
            div {
                input type="submit" value="Publish snippet";
            }
        }
    }
}

fn signup(form: &UserSignupForm, data: &TemplateData) -> Markup {
    let v = form.validator();
    html! {
        form action="/user/signup" method="post" novalidate {
            (csrf_input(data))
            div {
                label for="name" { "Name:" }
                (field_error(v, "name"))
                input type="text" id="name" name="name" value=(form.name);
            }
            div {
                label for="email" { "Email:" }
                (field_error(v, "email"))
                input type="email" id="email" name="email" value=(form.email);
            }
            div {
                label for="password" { "Password:" }
                (field_error(v, "password"))
                input type="password" id="password" name="password";
            }
            div {
                input type="submit" value="Signup";
            }
        }
    }
}

fn login(form: &UserLoginForm, data: &TemplateData) -> Markup {
    let v = form.validator();
    html! {
        form action="/user/login" method="post" novalidate {
            (csrf_input(data))
            (non_field_errors(v))
            div {
                label for="email" { "Email:" }
                (field_error(v, "email"))
                input type="email" id="email" name="email" value=(form.email);
            }
            div {
                label for="password" { "Password:" }
                (field_error(v, "password"))
                input type="password" id="password" name="password";
            }
            div {
                input type="submit" value="Login";
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn human_date_formats_in_utc() {
        let utc = Utc.with_ymd_and_hms(2024, 1, 25, 17, 30, 0).unwrap();
        assert_eq!(human_date(Some(&utc)), "25 Jan 2024 at 17:30");

        let cst = FixedOffset::west_opt(5 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 25, 17, 30, 0)
            .unwrap();
        assert_eq!(human_date(Some(&cst)), "25 Jan 2024 at 22:30");

        assert_eq!(human_date::<Utc>(None), "");
    }

    #[test]
    fn registered_helpers_are_used() {
        fn fixed(_: Option<&DateTime<Utc>>) -> String {
            "sometime".into()
        }
        let renderer = Renderer::new(TemplateFuncs { human_date: fixed });
        let snippet = Snippet {
            id: 3,
            title: "T".into(),
            content: "C".into(),
            created: Utc::now(),
            expires: Utc::now(),
        };
        let html = renderer
            .markup(&Page::View { snippet: &snippet }, &TemplateData::default())
            .into_string();
        assert!(html.contains("Created: sometime"));
    }

    #[test]
    fn login_page_shows_non_field_error_and_token() {
        let mut form = UserLoginForm::default();
        form.add_non_field_error("Email or password is incorrect");
        let data = TemplateData::new(None, false, "tok123".into());

        let html = Renderer::default()
            .markup(&Page::Login { form: &form }, &data)
            .into_string();
        assert!(html.contains("Email or password is incorrect"));
        assert!(html.contains(r#"name="csrf_token" value="tok123""#));
    }

    #[test]
    fn nav_depends_on_authentication() {
        let anon = TemplateData::new(None, false, String::new());
        let html = Renderer::default()
            .markup(&Page::Home { snippets: &[] }, &anon)
            .into_string();
        assert!(html.contains("/user/login"));
        assert!(!html.contains("/user/logout"));

        let authed = TemplateData::new(Some("Welcome".into()), true, String::new());
        let html = Renderer::default()
            .markup(&Page::Home { snippets: &[] }, &authed)
            .into_string();
        assert!(html.contains("/user/logout"));
        assert!(html.contains("Welcome"));
    }

    #[test]
    fn snippet_content_is_escaped() {
        let snippet = Snippet {
            id: 1,
            title: "<script>".into(),
            content: "<b>hi</b>".into(),
            created: Utc::now(),
            expires: Utc::now(),
        };
        let html = Renderer::default()
            .markup(&Page::View { snippet: &snippet }, &TemplateData::default())
            .into_string();
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<b>hi</b>"));
    }
}
