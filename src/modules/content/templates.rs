use std::path::Path;
use tera::{Context, Tera};

/// Page templates. Files under the templates directory override the
/// built-in set; missing ones fall back to it.
#[derive(Clone)]
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    pub fn new(templates_dir: &Path) -> Result<Self, tera::Error> {
        let builtin = Self::create_builtin_templates()?;

        if !templates_dir.is_dir() {
            log::info!("Using built-in templates");
            return Ok(Self { tera: builtin });
        }

        let pattern = format!("{}/**/*.html", templates_dir.display());
        log::debug!("Looking for templates with pattern: {}", pattern);

        match Tera::new(&pattern) {
            Ok(mut custom) => {
                log::info!(
                    "Loaded {} templates from {}",
                    custom.get_template_names().count(),
                    templates_dir.display()
                );
                // Templates already present in `custom` win.
                custom.extend(&builtin)?;
                Ok(Self { tera: custom })
            }
            Err(e) => {
                log::warn!("Failed to load templates: {}", e);
                log::info!("Using built-in templates");
                Ok(Self { tera: builtin })
            }
        }
    }

    pub fn render(&self, template: &str, context: &Context) -> Result<String, tera::Error> {
        self.tera.render(template, context)
    }

    fn create_builtin_templates() -> Result<Tera, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            ("base.html", BASE_TEMPLATE),
            ("index.html", INDEX_TEMPLATE),
            ("post.html", POST_TEMPLATE),
            ("make-post.html", MAKE_POST_TEMPLATE),
            ("register.html", REGISTER_TEMPLATE),
            ("login.html", LOGIN_TEMPLATE),
            ("about.html", ABOUT_TEMPLATE),
            ("contact.html", CONTACT_TEMPLATE),
        ])?;
        Ok(tera)
    }
}

const BASE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{% block title %}{{ site.title }}{% endblock title %}</title>
    <meta name="description" content="{{ site.description }}">
    <link rel="stylesheet" href="/static/css/styles.css">
</head>
<body>
    <nav>
        <a class="brand" href="/">{{ site.title }}</a>
        <a href="/">Home</a>
        {% if logged_in %}
        <a href="/logout">Log Out</a>
        {% else %}
        <a href="/login">Login</a>
        <a href="/register">Register</a>
        {% endif %}
        <a href="/about">About</a>
        <a href="/contact">Contact</a>
    </nav>

    <header>
        {% block header %}
        <h1>{{ site.title }}</h1>
        <span class="subheading">{{ site.description }}</span>
        {% endblock header %}
    </header>

    <main>
        {% for flash in flashes %}
        <p class="flash flash-{{ flash.level }}">{{ flash.message }}</p>
        {% endfor %}
        {% block content %}{% endblock content %}
    </main>

    <footer>
        <p>Copyright &copy; {{ site.author }}</p>
    </footer>
</body>
</html>
"#;

const INDEX_TEMPLATE: &str = r#"{% extends "base.html" %}
{% block content %}
<div class="post-list">
    {% if posts | length == 0 %}
    <p>No posts yet.</p>
    {% endif %}
    {% for post in posts %}
    <div class="post-preview">
        <a href="/post/{{ post.id }}">
            <h2 class="post-title">{{ post.title }}</h2>
            <h3 class="post-subtitle">{{ post.subtitle }}</h3>
        </a>
        <p class="post-meta">Posted by {{ post.author_name }} on {{ post.date }}
        {% if is_admin %}<a href="/delete/{{ post.id }}">✘</a>{% endif %}
        </p>
    </div>
    <hr>
    {% endfor %}
    {% if is_admin %}
    <div class="clearfix">
        <a class="btn" href="/new-post">Create New Post</a>
    </div>
    {% endif %}
</div>
{% endblock content %}
"#;

const POST_TEMPLATE: &str = r#"{% extends "base.html" %}
{% block title %}{{ post.title }} - {{ site.title }}{% endblock title %}
{% block header %}
<div class="post-heading" style="background-image: url('{{ post.img_url }}')">
    <h1>{{ post.title }}</h1>
    <h2 class="subheading">{{ post.subtitle }}</h2>
    <span class="meta">Posted by {{ post.author_name }} on {{ post.date }}</span>
</div>
{% endblock header %}
{% block content %}
<article>
    {{ post.body | safe }}
    <hr>
    {% if is_admin %}
    <div class="clearfix">
        <a class="btn" href="/edit-post/{{ post.id }}">Edit Post</a>
    </div>
    {% endif %}

    <form method="post" action="/post/{{ post.id }}" class="comment-form">
        <label for="body">Comment</label>
        <textarea id="body" name="body">{{ comment_body | default(value="") }}</textarea>
        {% if errors.body %}{% for error in errors.body %}<span class="field-error">{{ error }}</span>{% endfor %}{% endif %}
        <button type="submit">SUBMIT COMMENT</button>
    </form>

    <ul class="comment-list">
        {% for comment in comments %}
        <li>
            <div class="comment-text">{{ comment.text }}</div>
            <span class="date sub-text">{{ comment.author_name }}</span>
        </li>
        {% endfor %}
    </ul>
</article>
{% endblock content %}
"#;

const MAKE_POST_TEMPLATE: &str = r#"{% extends "base.html" %}
{% block header %}
{% if editing %}<h1>Edit Post</h1>{% else %}<h1>New Post</h1>{% endif %}
<span class="subheading">You're going to make a great blog post!</span>
{% endblock header %}
{% block content %}
<form method="post" action="{% if editing %}/edit-post/{{ post_id }}{% else %}/new-post{% endif %}">
    {% if author_name %}<p class="post-meta">Author: {{ author_name }}</p>{% endif %}

    <label for="title">Blog Post Title</label>
    <input id="title" name="title" value="{{ form.title | default(value="") }}">
    {% if errors.title %}{% for error in errors.title %}<span class="field-error">{{ error }}</span>{% endfor %}{% endif %}

    <label for="subtitle">Subtitle</label>
    <input id="subtitle" name="subtitle" value="{{ form.subtitle | default(value="") }}">
    {% if errors.subtitle %}{% for error in errors.subtitle %}<span class="field-error">{{ error }}</span>{% endfor %}{% endif %}

    <label for="img_url">Blog Image URL</label>
    <input id="img_url" name="img_url" value="{{ form.img_url | default(value="") }}">
    {% if errors.img_url %}{% for error in errors.img_url %}<span class="field-error">{{ error }}</span>{% endfor %}{% endif %}

    <label for="body">Blog Content</label>
    <textarea id="body" name="body">{{ form.body | default(value="") }}</textarea>
    {% if errors.body %}{% for error in errors.body %}<span class="field-error">{{ error }}</span>{% endfor %}{% endif %}

    <button type="submit">Submit Post</button>
</form>
{% endblock content %}
"#;

const REGISTER_TEMPLATE: &str = r#"{% extends "base.html" %}
{% block header %}<h1>Register</h1><span class="subheading">Start contributing to the blog!</span>{% endblock header %}
{% block content %}
<form method="post" action="/register">
    <label for="email">Email</label>
    <input id="email" name="email" type="email" value="{{ form.email | default(value="") }}">
    {% if errors.email %}{% for error in errors.email %}<span class="field-error">{{ error }}</span>{% endfor %}{% endif %}

    <label for="name">Full Name</label>
    <input id="name" name="name" value="{{ form.name | default(value="") }}">
    {% if errors.name %}{% for error in errors.name %}<span class="field-error">{{ error }}</span>{% endfor %}{% endif %}

    <label for="password">Password</label>
    <input id="password" name="password" type="password">
    {% if errors.password %}{% for error in errors.password %}<span class="field-error">{{ error }}</span>{% endfor %}{% endif %}

    <button type="submit">Submit</button>
</form>
{% endblock content %}
"#;

const LOGIN_TEMPLATE: &str = r#"{% extends "base.html" %}
{% block header %}<h1>Log In</h1><span class="subheading">Welcome Back!</span>{% endblock header %}
{% block content %}
<form method="post" action="/login">
    <label for="email">Email</label>
    <input id="email" name="email" type="email" value="{{ form.email | default(value="") }}">
    {% if errors.email %}{% for error in errors.email %}<span class="field-error">{{ error }}</span>{% endfor %}{% endif %}

    <label for="password">Password</label>
    <input id="password" name="password" type="password">
    {% if errors.password %}{% for error in errors.password %}<span class="field-error">{{ error }}</span>{% endfor %}{% endif %}

    <button type="submit">Log In</button>
</form>
{% endblock content %}
"#;

const ABOUT_TEMPLATE: &str = r#"{% extends "base.html" %}
{% block header %}<h1>About Me</h1><span class="subheading">This is what I do.</span>{% endblock header %}
{% block content %}
<p>{{ site.description }}</p>
{% endblock content %}
"#;

const CONTACT_TEMPLATE: &str = r#"{% extends "base.html" %}
{% block header %}
{% if msg_sent %}<h1>Successfully sent your message</h1>{% else %}<h1>Contact Me</h1>{% endif %}
<span class="subheading">Have questions? I have answers.</span>
{% endblock header %}
{% block content %}
<form method="post" action="/contact">
    <label for="name">Name</label>
    <input id="name" name="name" value="{{ form.name | default(value="") }}">
    {% if errors.name %}{% for error in errors.name %}<span class="field-error">{{ error }}</span>{% endfor %}{% endif %}

    <label for="email">Email Address</label>
    <input id="email" name="email" type="email" value="{{ form.email | default(value="") }}">
    {% if errors.email %}{% for error in errors.email %}<span class="field-error">{{ error }}</span>{% endfor %}{% endif %}

    <label for="phone">Phone Number</label>
    <input id="phone" name="phone" type="tel" value="{{ form.phone | default(value="") }}">

    <label for="message">Message</label>
    <textarea id="message" name="message">{{ form.message | default(value="") }}</textarea>
    {% if errors.message %}{% for error in errors.message %}<span class="field-error">{{ error }}</span>{% endfor %}{% endif %}

    <button type="submit">Send</button>
</form>
{% endblock content %}
"#;
