//! Markup of the login, consent and message pages.

use crate::pages::i18n::{self, Lang};
use std::fmt::Write;
use warden_scope::RequestedScope;

/// Escapes text for use in element content and quoted attribute values
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn layout(lang: Lang, title: &str, website: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="{lang}">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
</head>
<body>
<main>
<h1>{title}</h1>
{content}
</main>
<footer><a href="{website}">{website}</a></footer>
</body>
</html>
"#,
        lang = lang.code(),
        title = escape(title),
        website = escape(website),
        content = content,
    )
}

fn error_paragraph(message: Option<&str>) -> String {
    message
        .map(|message| format!(r#"<p class="error">{}</p>"#, escape(message)))
        .unwrap_or_default()
}

/// A headline with a single paragraph
pub fn message(lang: Lang, text: &i18n::MessageText, website: &str) -> String {
    let content = format!("<p>{}</p>", escape(text.text));
    layout(lang, text.headline, website, &content)
}

/// Sign-in link of a single sign-on provider
pub struct SsoLink {
    pub label: &'static str,
    pub url: String,
}

pub struct LoginForm<'a> {
    pub action: &'a str,
    pub email: &'a str,
    pub error: Option<&'a str>,
    pub sso_links: Vec<SsoLink>,
}

pub fn login(lang: Lang, form: &LoginForm<'_>, website: &str) -> String {
    let text = i18n::login(lang);
    let mut content = error_paragraph(form.error);

    let _ = write!(
        content,
        r#"<form method="post" action="{action}">
<label for="email">{email_label}</label>
<input type="email" id="email" name="email" value="{email}" autofocus>
<label for="password">{password_label}</label>
<input type="password" id="password" name="password">
<button type="submit">{submit}</button>
</form>
"#,
        action = escape(form.action),
        email_label = escape(text.email_label),
        email = escape(form.email),
        password_label = escape(text.password_label),
        submit = escape(text.submit_button),
    );

    if !form.sso_links.is_empty() {
        let _ = writeln!(content, "<p>{}</p>", escape(text.or));
        for link in &form.sso_links {
            let _ = writeln!(
                content,
                r#"<a class="sso" href="{}">{}</a>"#,
                escape(&link.url),
                escape(link.label)
            );
        }
    }

    layout(lang, text.headline, website, &content)
}

/// Lists the requested access rights, the form posts back to the same URL
pub fn consent(
    lang: Lang,
    client_name: &str,
    action: &str,
    scopes: &[RequestedScope],
    website: &str,
) -> String {
    let text = i18n::consent(lang);
    let mut content = format!("<h2>{}</h2>\n", escape(client_name));

    if scopes.is_empty() {
        let _ = writeln!(content, "<p>{}</p>", escape(text.noscopes_text));
    } else {
        let _ = writeln!(content, "<p>{}</p>\n<ul>", escape(text.text));
        for scope in scopes {
            let _ = writeln!(
                content,
                "<li>{}</li>",
                escape(scope.definition.description(lang.code()))
            );
        }
        content.push_str("</ul>\n");
    }

    let _ = write!(
        content,
        r#"<form method="post" action="{}">
<button type="submit">{}</button>
</form>
"#,
        escape(action),
        escape(text.submit_button)
    );

    layout(lang, text.headline, website, &content)
}

pub fn password_reset(lang: Lang, action: &str, error: Option<&str>, website: &str) -> String {
    let text = i18n::password_reset(lang);
    let mut content = error_paragraph(error);

    let _ = write!(
        content,
        r#"<form method="post" action="{action}">
<label for="oldpwd">{old}</label>
<input type="password" id="oldpwd" name="oldpwd" autofocus>
<label for="newpwd1">{new1}</label>
<input type="password" id="newpwd1" name="newpwd1">
<label for="newpwd2">{new2}</label>
<input type="password" id="newpwd2" name="newpwd2">
<button type="submit">{submit}</button>
</form>
"#,
        action = escape(action),
        old = escape(text.oldpwd_label),
        new1 = escape(text.newpwd1_label),
        new2 = escape(text.newpwd2_label),
        submit = escape(text.submit_button),
    );

    layout(lang, text.headline, website, &content)
}
