use actix_web::cookie::Key;
use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, HttpResponseBuilder};
use tera::Context;

use crate::config::Config;
use crate::contact::ContactMailer;
use crate::error::{AppError, AppResult};
use crate::flash::{self, FlashMessage, FLASH_COOKIE};
use crate::session;
use crate::storage::{BlogDB, User};
use crate::templates::TemplateRenderer;

/// Everything a handler needs, built once at startup.
#[derive(Clone)]
pub struct AppContext {
    pub config: Config,
    pub key: Key,
    pub templates: TemplateRenderer,
    pub mailer: ContactMailer,
}

impl AppContext {
    pub fn new(config: Config) -> AppResult<Self> {
        config
            .validate()
            .map_err(|e| AppError::Config(e.to_string()))?;
        let key = Key::derive_from(config.server.secret_key.as_bytes());
        let templates = TemplateRenderer::new(&config.paths.templates_dir)?;
        let mailer = ContactMailer::new(config.mail.clone());

        Ok(Self {
            config,
            key,
            templates,
            mailer,
        })
    }

    /// Open a database handle for the current request.
    pub fn db(&self) -> AppResult<BlogDB> {
        Ok(BlogDB::open(&self.config.database_path())?)
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.config.server.session_ttl_hours)
    }

    /// Render `template` as a full page.
    ///
    /// Adds the site settings, the viewer and any pending flash messages to
    /// `context`; flashes are cleared once shown.
    pub fn render(
        &self,
        req: &HttpRequest,
        viewer: Option<&User>,
        template: &str,
        mut context: Context,
    ) -> AppResult<HttpResponse> {
        let flashes = flash::read_flashes(req, &self.key);

        context.insert("site", &self.config.site);
        context.insert("current_user", &viewer);
        context.insert("logged_in", &viewer.is_some());
        context.insert("is_admin", &viewer.map(User::is_admin).unwrap_or(false));
        context.insert("flashes", &flashes);
        fill_page_defaults(&mut context);

        let html = self.templates.render(template, &context)?;

        let mut builder = HttpResponse::Ok();
        builder.content_type("text/html; charset=utf-8");
        if !flashes.is_empty() {
            builder.cookie(session::removal_cookie(FLASH_COOKIE));
        }
        Ok(builder.body(html))
    }

    pub fn redirect(&self, location: &str) -> HttpResponse {
        see_other(location).finish()
    }

    /// Redirect, leaving `message` for the next rendered page.
    pub fn redirect_with_flash(&self, location: &str, message: FlashMessage) -> HttpResponse {
        let mut builder = see_other(location);
        let cookie = flash::flash_cookie(&[message], self.config.server.secure_cookies);
        builder.cookie(session::sign(&self.key, cookie));
        builder.finish()
    }

    /// Redirect and drop the session cookie.
    pub fn logout_redirect(&self, location: &str) -> HttpResponse {
        let mut builder = see_other(location);
        builder.cookie(session::removal_cookie(session::SESSION_COOKIE));
        builder.finish()
    }

    /// Start a session for `user` and redirect to `location`.
    pub fn login_redirect(&self, user: &User, location: &str) -> AppResult<HttpResponse> {
        let db = self.db()?;
        let token = db.create_session(user.id)?;
        log::info!("User {} logged in", user.id);

        let server = &self.config.server;
        let cookie = session::session_cookie(&token, server.session_ttl_hours, server.secure_cookies);
        let mut builder = see_other(location);
        builder.cookie(session::sign(&self.key, cookie));
        Ok(builder.finish())
    }
}

/// Values every page template may read, for handlers that do not set them.
fn fill_page_defaults(context: &mut Context) {
    let empty = serde_json::Map::new();
    for name in ["errors", "form"] {
        if !context.contains_key(name) {
            context.insert(name, &empty);
        }
    }
    if !context.contains_key("editing") {
        context.insert("editing", &false);
    }
    if !context.contains_key("msg_sent") {
        context.insert("msg_sent", &false);
    }
}

fn see_other(location: &str) -> HttpResponseBuilder {
    let mut builder = HttpResponse::SeeOther();
    builder.append_header((header::LOCATION, location.to_string()));
    builder
}
