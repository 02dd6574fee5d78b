use actix_web::{web, HttpRequest, HttpResponse};
use serde::Serialize;
use tera::Context;

use crate::admin;
use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use crate::flash::FlashMessage;
use crate::forms::{CommentForm, ContactForm, FormErrors, LoginForm, RegisterForm};
use crate::password;
use crate::session::{self, AuthUser, Viewer};
use crate::storage::{BlogDB, Insert, User};

pub const ALREADY_REGISTERED: &str = "You've already signed up with that email. Login.";
pub const UNKNOWN_EMAIL: &str = "The email does not exist or is incorrect, please try again.";
pub const WRONG_PASSWORD: &str = "The password is incorrect, please try again.";
pub const LOGIN_TO_COMMENT: &str = "You need to login or register to comment.";
pub const MAIL_FAILED: &str = "Bad Credentials";

/// Template context for a form page: the submitted values and any errors.
pub fn form_context<T: Serialize>(form: &T, errors: Option<&FormErrors>) -> Context {
    let mut context = Context::new();
    context.insert("form", form);
    match errors {
        Some(errors) => context.insert("errors", &errors.by_field()),
        None => context.insert("errors", &FormErrors::default().by_field()),
    }
    context
}

/// List every post
pub async fn home(
    req: HttpRequest,
    ctx: web::Data<AppContext>,
    Viewer(viewer): Viewer,
) -> AppResult<HttpResponse> {
    let db = ctx.db()?;
    let posts = db.list_posts()?;

    let mut context = Context::new();
    context.insert("posts", &posts);
    ctx.render(&req, viewer.as_ref(), "index.html", context)
}

fn render_post(
    req: &HttpRequest,
    ctx: &AppContext,
    db: &BlogDB,
    viewer: Option<&User>,
    post_id: i64,
    form: &CommentForm,
    errors: Option<&FormErrors>,
) -> AppResult<HttpResponse> {
    let post = db
        .get_post(post_id)?
        .ok_or_else(|| AppError::NotFound(format!("Post {}", post_id)))?;
    let comments = db.get_comments_for_post(post_id)?;

    let mut context = form_context(form, errors);
    context.insert("post", &post);
    context.insert("comments", &comments);
    context.insert("comment_body", &form.body);
    ctx.render(req, viewer, "post.html", context)
}

/// Show a post with its comments
pub async fn show_post(
    req: HttpRequest,
    ctx: web::Data<AppContext>,
    path: web::Path<i64>,
    Viewer(viewer): Viewer,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    log::debug!("Showing post {}", post_id);

    let db = ctx.db()?;
    render_post(&req, &ctx, &db, viewer.as_ref(), post_id, &CommentForm::default(), None)
}

/// Add a comment to a post. Anonymous callers are sent to the login page.
pub async fn add_comment(
    req: HttpRequest,
    ctx: web::Data<AppContext>,
    path: web::Path<i64>,
    Viewer(viewer): Viewer,
    form: web::Form<CommentForm>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();

    let Some(user) = viewer else {
        log::debug!("Anonymous comment on post {} rejected", post_id);
        return Ok(ctx.redirect_with_flash("/login", FlashMessage::message(LOGIN_TO_COMMENT)));
    };

    let db = ctx.db()?;
    if db.get_post(post_id)?.is_none() {
        return Err(AppError::NotFound(format!("Post {}", post_id)));
    }

    match form.validate() {
        Ok(text) => {
            let comment_id = db.add_comment(post_id, user.id, &text)?;
            log::info!("Comment {} added to post {} by user {}", comment_id, post_id, user.id);
            Ok(ctx.redirect(&format!("/post/{}", post_id)))
        }
        Err(errors) => render_post(&req, &ctx, &db, Some(&user), post_id, &form, Some(&errors)),
    }
}

pub async fn register_page(
    req: HttpRequest,
    ctx: web::Data<AppContext>,
    Viewer(viewer): Viewer,
) -> AppResult<HttpResponse> {
    let context = form_context(&RegisterForm::default(), None);
    ctx.render(&req, viewer.as_ref(), "register.html", context)
}

/// Create an account and log it in
pub async fn register(
    req: HttpRequest,
    ctx: web::Data<AppContext>,
    Viewer(viewer): Viewer,
    form: web::Form<RegisterForm>,
) -> AppResult<HttpResponse> {
    let form = match form.validate() {
        Ok(form) => form,
        Err(errors) => {
            let context = form_context(&*form, Some(&errors));
            return ctx.render(&req, viewer.as_ref(), "register.html", context);
        }
    };

    let db = ctx.db()?;
    if db.find_user_by_email(&form.email)?.is_some() {
        log::debug!("Registration with known email {}", form.email);
        return Ok(ctx.redirect_with_flash("/login", FlashMessage::error(ALREADY_REGISTERED)));
    }

    let password_hash = password::hash_password(&form.password)?;
    match db.create_user(&form.email, &form.name, &password_hash)? {
        Insert::Created(user) => {
            log::info!("User {} registered", user.id);
            ctx.login_redirect(&user, "/")
        }
        Insert::Duplicate => {
            Ok(ctx.redirect_with_flash("/login", FlashMessage::error(ALREADY_REGISTERED)))
        }
    }
}

pub async fn login_page(
    req: HttpRequest,
    ctx: web::Data<AppContext>,
    Viewer(viewer): Viewer,
) -> AppResult<HttpResponse> {
    let context = form_context(&LoginForm::default(), None);
    ctx.render(&req, viewer.as_ref(), "login.html", context)
}

pub async fn login(
    req: HttpRequest,
    ctx: web::Data<AppContext>,
    Viewer(viewer): Viewer,
    form: web::Form<LoginForm>,
) -> AppResult<HttpResponse> {
    let form = match form.validate() {
        Ok(form) => form,
        Err(errors) => {
            let context = form_context(&*form, Some(&errors));
            return ctx.render(&req, viewer.as_ref(), "login.html", context);
        }
    };

    let db = ctx.db()?;
    let Some(user) = db.find_user_by_email(&form.email)? else {
        log::debug!("Login attempt for unknown email {}", form.email);
        return Ok(ctx.redirect_with_flash("/login", FlashMessage::message(UNKNOWN_EMAIL)));
    };

    if !password::verify_password(&form.password, &user.password_hash)? {
        log::debug!("Wrong password for user {}", user.id);
        return Ok(ctx.redirect_with_flash("/login", FlashMessage::message(WRONG_PASSWORD)));
    }

    ctx.login_redirect(&user, "/")
}

/// End the caller's session. Requires one.
pub async fn logout(
    req: HttpRequest,
    ctx: web::Data<AppContext>,
    AuthUser(user): AuthUser,
) -> AppResult<HttpResponse> {
    if let Some(token) = session::session_token(&req, &ctx.key) {
        ctx.db()?.delete_session(&token)?;
    }
    log::info!("User {} logged out", user.id);

    Ok(ctx.logout_redirect("/"))
}

pub async fn about(
    req: HttpRequest,
    ctx: web::Data<AppContext>,
    Viewer(viewer): Viewer,
) -> AppResult<HttpResponse> {
    ctx.render(&req, viewer.as_ref(), "about.html", Context::new())
}

pub async fn contact_page(
    req: HttpRequest,
    ctx: web::Data<AppContext>,
    Viewer(viewer): Viewer,
) -> AppResult<HttpResponse> {
    let mut context = form_context(&ContactForm::default(), None);
    context.insert("msg_sent", &false);
    ctx.render(&req, viewer.as_ref(), "contact.html", context)
}

/// Relay a contact message to the site owner
pub async fn contact(
    req: HttpRequest,
    ctx: web::Data<AppContext>,
    Viewer(viewer): Viewer,
    form: web::Form<ContactForm>,
) -> AppResult<HttpResponse> {
    let message = match form.validate() {
        Ok(message) => message,
        Err(errors) => {
            let mut context = form_context(&*form, Some(&errors));
            context.insert("msg_sent", &false);
            return ctx.render(&req, viewer.as_ref(), "contact.html", context);
        }
    };

    if let Err(e) = ctx.mailer.send(&message).await {
        log::warn!("Failed to relay contact message: {}", e);
        return Ok(ctx.redirect_with_flash("/contact", FlashMessage::message(MAIL_FAILED)));
    }

    let mut context = form_context(&ContactForm::default(), None);
    context.insert("msg_sent", &true);
    ctx.render(&req, viewer.as_ref(), "contact.html", context)
}

/// Configure routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    admin::configure_admin_routes(cfg);

    cfg.route("/", web::get().to(home))
        .route("/post/{id}", web::get().to(show_post))
        .route("/post/{id}", web::post().to(add_comment))
        .route("/register", web::get().to(register_page))
        .route("/register", web::post().to(register))
        .route("/login", web::get().to(login_page))
        .route("/login", web::post().to(login))
        .route("/logout", web::get().to(logout))
        .route("/about", web::get().to(about))
        .route("/contact", web::get().to(contact_page))
        .route("/contact", web::post().to(contact));
}
