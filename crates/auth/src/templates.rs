//! HTML templates for the auth pages.
//!
//! Pages are plain `format!` strings. Every interpolated value goes through
//! `html_escape`.

use authgate_core::auth::REDIRECT_PARAM;

use crate::form::AuthForm;

/// Escape HTML special characters.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

const STYLE: &str = r#"
    body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; background: #f5f5f5; margin: 0; }
    main { max-width: 420px; margin: 64px auto; background: white; padding: 32px; border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }
    h1 { margin-top: 0; font-size: 24px; }
    label { display: block; margin: 12px 0 4px; font-weight: 500; }
    input { width: 100%; padding: 8px; box-sizing: border-box; border: 1px solid #ccc; border-radius: 4px; }
    button { margin-top: 20px; width: 100%; padding: 10px; background: #1a73e8; color: white; border: none; border-radius: 4px; cursor: pointer; }
    button:disabled { background: #9bbbe8; cursor: wait; }
    .error { color: #c5221f; background: #fce8e6; padding: 8px 12px; border-radius: 4px; }
    .muted { color: #666; font-size: 14px; }
"#;

/// Disables the submit button while the form posts.
const LOADING_SCRIPT: &str = r#"
    <script>
        document.querySelectorAll('form[data-auth-form]').forEach(function (form) {
            form.addEventListener('submit', function () {
                var button = form.querySelector('button[type=submit]');
                button.disabled = true;
                button.textContent = button.dataset.loadingText;
            });
        });
    </script>
"#;

/// Wrap `body` in the shared page layout.
pub fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>{STYLE}</style>
</head>
<body>
    <main>
{body}
    </main>
</body>
</html>"#,
        title = html_escape(title),
    )
}

/// Client for the `/auth/events` stream: re-render on sign-in, go to the
/// login page on sign-out.
///
/// The stream path travels in a `data-` attribute, where HTML escaping is
/// the right escaping, rather than inside the script body.
pub fn auth_events_script(events_path: &str) -> String {
    format!(
        r#"
    <script data-events="{path}">
        (function () {{
            var source = new EventSource(document.currentScript.dataset.events);
            source.addEventListener('refresh', function () {{ window.location.reload(); }});
            source.addEventListener('navigate', function (e) {{
                source.close();
                window.location.assign(e.data);
            }});
        }})();
    </script>
"#,
        path = html_escape(events_path),
    )
}

fn error_block(form: &AuthForm) -> String {
    form.error
        .as_deref()
        .map(|e| format!(r#"        <p class="error" role="alert">{}</p>"#, html_escape(e)))
        .unwrap_or_default()
}

/// The sign-in page. `redirect_to` is carried through a hidden field.
pub fn login_page(
    login_path: &str,
    sign_up_path: &str,
    form: &AuthForm,
    redirect_to: Option<&str>,
) -> String {
    let hidden = redirect_to
        .map(|r| {
            format!(
                r#"<input type="hidden" name="{REDIRECT_PARAM}" value="{}">"#,
                html_escape(r)
            )
        })
        .unwrap_or_default();
    let disabled = if form.loading { " disabled" } else { "" };

    let body = format!(
        r#"        <h1>Login</h1>
        <p class="muted">Enter your email below to login to your account</p>
{error}
        <form method="post" action="{action}" data-auth-form>
            {hidden}
            <label for="email">Email</label>
            <input id="email" name="email" type="email" placeholder="m@example.com" value="{email}" required>
            <label for="password">Password</label>
            <input id="password" name="password" type="password" required>
            <button type="submit" data-loading-text="Logging in..."{disabled}>Login</button>
        </form>
        <p class="muted">Don't have an account? <a href="{sign_up}">Sign up</a></p>
{script}"#,
        error = error_block(form),
        action = html_escape(login_path),
        email = html_escape(&form.email),
        sign_up = html_escape(sign_up_path),
        script = LOADING_SCRIPT,
    );
    layout("Login", &body)
}

/// The sign-up page.
pub fn sign_up_page(sign_up_path: &str, login_path: &str, form: &AuthForm) -> String {
    let disabled = if form.loading { " disabled" } else { "" };

    let body = format!(
        r#"        <h1>Sign up</h1>
        <p class="muted">Create a new account</p>
{error}
        <form method="post" action="{action}" data-auth-form>
            <label for="email">Email</label>
            <input id="email" name="email" type="email" placeholder="m@example.com" value="{email}" required>
            <label for="password">Password</label>
            <input id="password" name="password" type="password" required>
            <label for="repeat_password">Repeat Password</label>
            <input id="repeat_password" name="repeat_password" type="password" required>
            <button type="submit" data-loading-text="Creating an account..."{disabled}>Sign up</button>
        </form>
        <p class="muted">Already have an account? <a href="{login}">Login</a></p>
{script}"#,
        error = error_block(form),
        action = html_escape(sign_up_path),
        email = html_escape(&form.email),
        login = html_escape(login_path),
        script = LOADING_SCRIPT,
    );
    layout("Sign up", &body)
}

pub fn sign_up_success_page() -> String {
    layout(
        "Check your email",
        r#"        <h1>Thank you for signing up!</h1>
        <p>You've successfully signed up. Please check your email to confirm your account before signing in.</p>"#,
    )
}

/// Error page; `message` is shown as-is (escaped).
pub fn error_page(message: Option<&str>, login_path: &str) -> String {
    let detail = match message {
        Some(m) => format!("<p>Code error: {}</p>", html_escape(m)),
        None => "<p>An unspecified error occurred.</p>".to_string(),
    };
    let body = format!(
        r#"        <h1>Sorry, something went wrong.</h1>
        {detail}
        <p><a href="{login}">Back to login</a></p>"#,
        login = html_escape(login_path),
    );
    layout("Error", &body)
}
