use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Local;

use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use crate::forms::{FormErrors, PostForm};
use crate::routes::form_context;
use crate::session::AdminUser;
use crate::storage::{Insert, User, POST_DATE_FORMAT};

const DUPLICATE_TITLE: &str = "A post with this title already exists.";

/// Which post the editor page is for.
enum Editor<'a> {
    New,
    Existing { id: i64, author_name: &'a str },
}

fn render_editor(
    req: &HttpRequest,
    ctx: &AppContext,
    admin: &User,
    editor: Editor<'_>,
    form: &PostForm,
    errors: Option<&FormErrors>,
) -> AppResult<HttpResponse> {
    let mut context = form_context(form, errors);
    match editor {
        Editor::New => {
            context.insert("editing", &false);
            context.insert("author_name", "");
        }
        Editor::Existing { id, author_name } => {
            context.insert("editing", &true);
            context.insert("post_id", &id);
            context.insert("author_name", author_name);
        }
    }
    ctx.render(req, Some(admin), "make-post.html", context)
}

/// Empty post editor
pub async fn new_post_page(
    AdminUser(admin): AdminUser,
    req: HttpRequest,
    ctx: web::Data<AppContext>,
) -> AppResult<HttpResponse> {
    render_editor(&req, &ctx, &admin, Editor::New, &PostForm::default(), None)
}

/// Publish a post dated today under the admin's name.
pub async fn create_post(
    AdminUser(admin): AdminUser,
    req: HttpRequest,
    ctx: web::Data<AppContext>,
    form: web::Form<PostForm>,
) -> AppResult<HttpResponse> {
    let content = match form.validate() {
        Ok(content) => content,
        Err(errors) => return render_editor(&req, &ctx, &admin, Editor::New, &form, Some(&errors)),
    };

    let date = Local::now().format(POST_DATE_FORMAT).to_string();
    let db = ctx.db()?;
    match db.create_post(&content, &date, &admin)? {
        Insert::Created(post) => {
            log::info!("Post {} created by user {}", post.id, admin.id);
            Ok(ctx.redirect("/"))
        }
        Insert::Duplicate => {
            let errors = FormErrors::single("title", DUPLICATE_TITLE);
            render_editor(&req, &ctx, &admin, Editor::New, &form, Some(&errors))
        }
    }
}

/// Editor pre-filled with an existing post
pub async fn edit_post_page(
    AdminUser(admin): AdminUser,
    req: HttpRequest,
    ctx: web::Data<AppContext>,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    let db = ctx.db()?;
    let post = db
        .get_post(post_id)?
        .ok_or_else(|| AppError::NotFound(format!("Post {}", post_id)))?;

    let form = PostForm::from(&post);
    let editor = Editor::Existing {
        id: post.id,
        author_name: &post.author_name,
    };
    render_editor(&req, &ctx, &admin, editor, &form, None)
}

/// Replace a post's content. Date and author stay as they were.
pub async fn update_post(
    AdminUser(admin): AdminUser,
    req: HttpRequest,
    ctx: web::Data<AppContext>,
    path: web::Path<i64>,
    form: web::Form<PostForm>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    let db = ctx.db()?;
    let post = db
        .get_post(post_id)?
        .ok_or_else(|| AppError::NotFound(format!("Post {}", post_id)))?;
    let editor = || Editor::Existing {
        id: post.id,
        author_name: &post.author_name,
    };

    let content = match form.validate() {
        Ok(content) => content,
        Err(errors) => return render_editor(&req, &ctx, &admin, editor(), &form, Some(&errors)),
    };

    match db.update_post(post_id, &content)? {
        Some(Insert::Created(())) => {
            log::info!("Post {} updated by user {}", post_id, admin.id);
            Ok(ctx.redirect(&format!("/post/{}", post_id)))
        }
        Some(Insert::Duplicate) => {
            let errors = FormErrors::single("title", DUPLICATE_TITLE);
            render_editor(&req, &ctx, &admin, editor(), &form, Some(&errors))
        }
        None => Err(AppError::NotFound(format!("Post {}", post_id))),
    }
}

/// Delete a post and its comments
pub async fn delete_post(
    AdminUser(admin): AdminUser,
    ctx: web::Data<AppContext>,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    if !ctx.db()?.delete_post(post_id)? {
        return Err(AppError::NotFound(format!("Post {}", post_id)));
    }

    log::info!("Post {} deleted by user {}", post_id, admin.id);
    Ok(ctx.redirect("/"))
}

/// Configure admin routes
pub fn configure_admin_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/new-post", web::get().to(new_post_page))
        .route("/new-post", web::post().to(create_post))
        .route("/edit-post/{id}", web::get().to(edit_post_page))
        .route("/edit-post/{id}", web::post().to(update_post))
        .route("/delete/{id}", web::get().to(delete_post));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::web::routes::configure_routes;
    use crate::modules::web::routes::tests::{location, register_request, test_context, Jar};
    use actix_web::http::StatusCode;
    use actix_web::{test, App};

    fn post_form(title: &str) -> [(&'static str, String); 4] {
        [
            ("title", title.to_string()),
            ("subtitle", "A subtitle".to_string()),
            ("img_url", "https://example.com/cover.png".to_string()),
            ("body", "<p>Hello</p>".to_string()),
        ]
    }

    #[actix_web::test]
    async fn test_only_first_user_is_admin() {
        let (ctx, path) = test_context();
        let app = test::init_service(App::new().app_data(ctx.clone()).configure(configure_routes)).await;

        let mut admin = Jar::default();
        let resp = test::call_service(&app, register_request(&admin, "admin@x.com", "Admin", "p").to_request()).await;
        admin.update(&resp);
        let mut reader = Jar::default();
        let resp = test::call_service(&app, register_request(&reader, "r@x.com", "Reader", "p").to_request()).await;
        reader.update(&resp);

        let resp = test::call_service(&app, admin.apply(test::TestRequest::get().uri("/new-post")).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = test::call_service(&app, reader.apply(test::TestRequest::get().uri("/new-post")).to_request()).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp = test::call_service(&app, test::TestRequest::get().uri("/new-post").to_request()).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp = test::call_service(
            &app,
            reader
                .apply(test::TestRequest::post().uri("/new-post").set_form(post_form("Sneaky")))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert!(ctx.db().unwrap().list_posts().unwrap().is_empty());

        std::fs::remove_file(&path).ok();
    }

    #[actix_web::test]
    async fn test_post_lifecycle() {
        let (ctx, path) = test_context();
        let app = test::init_service(App::new().app_data(ctx.clone()).configure(configure_routes)).await;

        let mut admin = Jar::default();
        let resp = test::call_service(&app, register_request(&admin, "admin@x.com", "Admin", "p").to_request()).await;
        admin.update(&resp);

        // create
        let resp = test::call_service(
            &app,
            admin
                .apply(test::TestRequest::post().uri("/new-post").set_form(post_form("First Post")))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&resp), "/");

        let posts = ctx.db().unwrap().list_posts().unwrap();
        assert_eq!(posts.len(), 1);
        let post = &posts[0];
        assert_eq!(post.author_id, Some(1));
        assert_eq!(post.author_name, "Admin");
        assert_eq!(post.date, Local::now().format(POST_DATE_FORMAT).to_string());

        let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert!(body.contains("First Post"));

        // duplicate title stays on the form
        let resp = test::call_service(
            &app,
            admin
                .apply(test::TestRequest::post().uri("/new-post").set_form(post_form("First Post")))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert!(body.contains(DUPLICATE_TITLE));

        // edit keeps date and author
        let resp = test::call_service(
            &app,
            admin
                .apply(test::TestRequest::get().uri(&format!("/edit-post/{}", post.id)))
                .to_request(),
        )
        .await;
        let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert!(body.contains("value=\"First Post\""));
        assert!(body.contains("Author: Admin"));

        let resp = test::call_service(
            &app,
            admin
                .apply(test::TestRequest::post().uri(&format!("/edit-post/{}", post.id)).set_form(post_form("Renamed")))
                .to_request(),
        )
        .await;
        assert_eq!(location(&resp), format!("/post/{}", post.id));
        let updated = ctx.db().unwrap().get_post(post.id).unwrap().unwrap();
        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.date, post.date);
        assert_eq!(updated.author_id, post.author_id);

        // delete
        let resp = test::call_service(
            &app,
            admin.apply(test::TestRequest::get().uri(&format!("/delete/{}", post.id))).to_request(),
        )
        .await;
        assert_eq!(location(&resp), "/");
        let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert!(!body.contains("Renamed"));

        let resp = test::call_service(
            &app,
            admin.apply(test::TestRequest::get().uri(&format!("/delete/{}", post.id))).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        std::fs::remove_file(&path).ok();
    }

    #[actix_web::test]
    async fn test_unknown_post_is_not_found() {
        let (ctx, path) = test_context();
        let app = test::init_service(App::new().app_data(ctx.clone()).configure(configure_routes)).await;

        let mut admin = Jar::default();
        let resp = test::call_service(&app, register_request(&admin, "admin@x.com", "Admin", "p").to_request()).await;
        admin.update(&resp);

        let resp = test::call_service(&app, admin.apply(test::TestRequest::get().uri("/edit-post/42")).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = test::call_service(
            &app,
            admin
                .apply(test::TestRequest::post().uri("/edit-post/42").set_form(post_form("Ghost")))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        std::fs::remove_file(&path).ok();
    }

    #[actix_web::test]
    async fn test_invalid_image_url_rerenders() {
        let (ctx, path) = test_context();
        let app = test::init_service(App::new().app_data(ctx.clone()).configure(configure_routes)).await;

        let mut admin = Jar::default();
        let resp = test::call_service(&app, register_request(&admin, "admin@x.com", "Admin", "p").to_request()).await;
        admin.update(&resp);

        let mut form = post_form("Bad Image");
        form[2].1 = "not a url".to_string();
        let resp = test::call_service(
            &app,
            admin.apply(test::TestRequest::post().uri("/new-post").set_form(form)).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert!(body.contains("Invalid URL."));
        assert!(ctx.db().unwrap().list_posts().unwrap().is_empty());

        std::fs::remove_file(&path).ok();
    }
}
