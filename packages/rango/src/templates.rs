//! Template engine setup and HTML templates.
//!
//! Templates are embedded in the binary; every page extends `base.html`.

use axum::response::Html;
use tera::{Context, Tera};

use crate::entity::user;
use crate::error::AppError;
use crate::state::AppState;

/// Build the template engine with every embedded template registered.
pub fn load() -> Result<Tera, tera::Error> {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![
        ("base.html", BASE_TEMPLATE),
        ("index.html", INDEX_TEMPLATE),
        ("about.html", ABOUT_TEMPLATE),
        ("category.html", CATEGORY_TEMPLATE),
        ("add_category.html", ADD_CATEGORY_TEMPLATE),
        ("add_page.html", ADD_PAGE_TEMPLATE),
        ("register.html", REGISTER_TEMPLATE),
        ("login.html", LOGIN_TEMPLATE),
        ("restricted.html", RESTRICTED_TEMPLATE),
    ])?;
    Ok(tera)
}

/// Context every page starts from: site title and the logged-in user.
pub fn base_context(state: &AppState, current_user: Option<&user::Model>) -> Context {
    let mut context = Context::new();
    context.insert("site_title", &state.config.site.title);
    context.insert("current_user", &current_user.map(|u| u.username.as_str()));
    context
}

pub fn render(state: &AppState, template: &str, context: &Context) -> Result<Html<String>, AppError> {
    Ok(Html(state.templates.render(template, context)?))
}

// =============================================================================
// Embedded templates
// =============================================================================

const BASE_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{{ site_title }} - {% block title %}How to Tango with Rust!{% endblock title %}</title>
    <style>
        body { font-family: -apple-system, "Segoe UI", Helvetica, Arial, sans-serif; margin: 0; color: #222; }
        header { border-bottom: 1px solid #ddd; padding: 12px 24px; display: flex; justify-content: space-between; }
        header a { margin-left: 16px; color: #0b5394; text-decoration: none; }
        main { max-width: 960px; margin: 0 auto; padding: 24px; }
        .errorlist { color: #b00020; }
        label { display: block; margin-top: 12px; }
    </style>
</head>
<body>
    <header>
        <a class="brand" href="/rango/">{{ site_title }}</a>
        <nav>
            {% if current_user %}
            <span>Logged in as {{ current_user }}</span>
            <a href="/rango/restricted/">Restricted Page</a>
            <a href="/rango/add_category/">Add a New Category</a>
            <a href="/rango/logout/">Logout</a>
            {% else %}
            <a href="/rango/register/">Sign Up</a>
            <a href="/rango/login/">Login</a>
            {% endif %}
            <a href="/rango/about/">About</a>
            <a href="/rango/">Index</a>
        </nav>
    </header>
    <main>
        {% block body %}{% endblock body %}
    </main>
</body>
</html>
"##;

const INDEX_TEMPLATE: &str = r##"{% extends "base.html" %}
{% block title %}Homepage{% endblock title %}
{% block body %}
<h1>Rango says...</h1>
<p>{% if current_user %}howdy {{ current_user }}!{% else %}hey there partner!{% endif %}</p>
<p><strong>{{ boldmessage }}</strong></p>

<h2>Most Liked Categories</h2>
{% if categories %}
<ul>
    {% for category in categories %}
    <li><a href="/rango/category/{{ category.slug }}/">{{ category.name }}</a></li>
    {% endfor %}
</ul>
{% else %}
<strong>There are no categories present.</strong>
{% endif %}

<h2>Most Viewed Pages</h2>
{% if pages %}
<ul>
    {% for page in pages %}
    <li><a href="{{ page.url }}">{{ page.title }}</a></li>
    {% endfor %}
</ul>
{% else %}
<strong>There are no pages present.</strong>
{% endif %}
{% endblock body %}
"##;

const ABOUT_TEMPLATE: &str = r##"{% extends "base.html" %}
{% block title %}About{% endblock title %}
{% block body %}
<h1>Rango says here is the about page.</h1>
<p>This tutorial has been put together by {{ name }}.</p>
<p>Visits: {{ visits }}</p>
{% endblock body %}
"##;

const CATEGORY_TEMPLATE: &str = r##"{% extends "base.html" %}
{% block title %}{% if category %}{{ category.name }}{% else %}Unknown Category{% endif %}{% endblock title %}
{% block body %}
{% if category %}
<h1>{{ category.name }}</h1>
{% if pages %}
<ul>
    {% for page in pages %}
    <li><a href="{{ page.url }}">{{ page.title }}</a></li>
    {% endfor %}
</ul>
{% else %}
<strong>No pages currently in category.</strong>
{% endif %}
{% if current_user %}
<p><a href="/rango/category/{{ category.slug }}/add_page/">Add a Page</a></p>
{% endif %}
{% else %}
<strong>The specified category does not exist.</strong>
{% endif %}
{% endblock body %}
"##;

const ADD_CATEGORY_TEMPLATE: &str = r##"{% extends "base.html" %}
{% block title %}Add a Category{% endblock title %}
{% block body %}
<h1>Add a Category</h1>
{% if errors %}
<ul class="errorlist">
    {% for field, messages in errors %}{% for message in messages %}
    <li>{{ field }}: {{ message }}</li>
    {% endfor %}{% endfor %}
</ul>
{% endif %}
<form id="category_form" method="post" action="/rango/add_category/">
    <label for="id_name">Please enter the category name.</label>
    <input id="id_name" type="text" name="name" maxlength="128" value="{{ form.name }}" required>
    <input type="submit" name="submit" value="Create Category">
</form>
{% endblock body %}
"##;

const ADD_PAGE_TEMPLATE: &str = r##"{% extends "base.html" %}
{% block title %}Add a Page{% endblock title %}
{% block body %}
<h1>Add a Page to {{ category.name }}</h1>
{% if errors %}
<ul class="errorlist">
    {% for field, messages in errors %}{% for message in messages %}
    <li>{{ field }}: {{ message }}</li>
    {% endfor %}{% endfor %}
</ul>
{% endif %}
<form id="page_form" method="post" action="/rango/category/{{ category.slug }}/add_page/">
    <label for="id_title">Please enter the title of the page.</label>
    <input id="id_title" type="text" name="title" maxlength="128" value="{{ form.title }}" required>
    <label for="id_url">Please enter the URL of the page.</label>
    <input id="id_url" type="text" name="url" maxlength="200" value="{{ form.url }}" required>
    <input type="submit" name="submit" value="Add Page">
</form>
{% endblock body %}
"##;

const REGISTER_TEMPLATE: &str = r##"{% extends "base.html" %}
{% block title %}Register{% endblock title %}
{% block body %}
<h1>Register for Rango</h1>
{% if registered %}
<p>Rango says: <strong>thank you for registering!</strong></p>
<p><a href="/rango/">Return to the homepage.</a></p>
{% else %}
<p>Rango says: <strong>register here!</strong></p>
{% if errors %}
<ul class="errorlist">
    {% for field, messages in errors %}{% for message in messages %}
    <li>{{ field }}: {{ message }}</li>
    {% endfor %}{% endfor %}
</ul>
{% endif %}
<form id="user_form" method="post" action="/rango/register/" enctype="multipart/form-data">
    <label for="id_username">Username</label>
    <input id="id_username" type="text" name="username" maxlength="150" value="{{ user_form.username }}" required>
    <label for="id_email">Email address</label>
    <input id="id_email" type="email" name="email" value="{{ user_form.email }}">
    <label for="id_password">Password</label>
    <input id="id_password" type="password" name="password" required>
    <label for="id_website">Website</label>
    <input id="id_website" type="url" name="website" maxlength="200" value="{{ profile_form.website }}">
    <label for="id_picture">Picture</label>
    <input id="id_picture" type="file" name="picture" accept="image/*">
    <input type="submit" name="submit" value="Register">
</form>
{% endif %}
{% endblock body %}
"##;

const LOGIN_TEMPLATE: &str = r##"{% extends "base.html" %}
{% block title %}Login{% endblock title %}
{% block body %}
<h1>Login to Rango</h1>
<form id="login_form" method="post" action="/rango/login/">
    <label for="id_username">Username</label>
    <input id="id_username" type="text" name="username" required>
    <label for="id_password">Password</label>
    <input id="id_password" type="password" name="password" required>
    <input type="hidden" name="next" value="{{ next }}">
    <input type="submit" value="Submit">
</form>
{% endblock body %}
"##;

const RESTRICTED_TEMPLATE: &str = r##"{% extends "base.html" %}
{% block title %}Restricted Page{% endblock title %}
{% block body %}
<h1>Rango says...</h1>
<p>Since you're logged in, you can see this text!</p>
{% endblock body %}
"##;
