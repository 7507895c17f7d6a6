use crate::client::BlogClientHttp;
use crate::error::{BlogClientError, FieldErrors};
use crate::model::{display_time, PostDraft, PostQuery, PostStatus};
use crate::session::{sign_in, sign_out, use_session, Session};
use dioxus::logger::tracing::warn;
use dioxus::prelude::*;

mod client;
mod error;
mod model;
mod session;

const BASE_URL: &str = "http://127.0.0.1:8080";

#[derive(Clone, Routable, Debug, PartialEq)]
#[rustfmt::skip]
enum Route {
    #[layout(Navbar)]
        #[route("/")]
        Posts {},
        #[route("/posts/:id")]
        PostDetail { id: i64 },
        #[route("/create")]
        CreatePost {},
        #[route("/edit/:id")]
        EditPost { id: i64 },
        #[route("/login")]
        Login {},
        #[route("/register")]
        Register {},
    #[end_layout]
    #[route("/:..segments")]
    NotFound { segments: Vec<String> },
}

const MAIN_CSS: Asset = asset!("/assets/main.css");

fn main() {
    dioxus::launch(App);
}

fn api() -> BlogClientHttp {
    BlogClientHttp::connect(BASE_URL)
}

#[component]
fn App() -> Element {
    let session = use_signal(Session::restore);
    provide_context(session);

    rsx! {
        document::Link { rel: "stylesheet", href: MAIN_CSS }
        Router::<Route> {}
    }
}

/// First message for `field`, if the server rejected it.
fn field_error(errors: &FieldErrors, field: &str) -> Option<String> {
    errors.get(field).and_then(|messages| messages.first()).cloned()
}

#[component]
fn FieldError(errors: FieldErrors, #[props(into)] field: String) -> Element {
    match field_error(&errors, &field) {
        Some(message) => rsx! { p { class: "field-error", "{message}" } },
        None => rsx! {},
    }
}

#[component]
fn Posts() -> Element {
    let session = use_session();
    let navigator = use_navigator();
    let mut status_filter = use_signal(|| None::<PostStatus>);
    let mut author_filter = use_signal(String::new);
    let mut search_filter = use_signal(String::new);
    let mut action_error = use_signal(|| None::<String>);

    let mut posts = use_resource(move || {
        let current = session();
        let query = PostQuery {
            status: status_filter(),
            author: author_filter(),
            search: search_filter(),
        };
        async move { api().list_posts(&current, &query).await }
    });

    let on_delete = move |id: i64| {
        let current = session();
        spawn(async move {
            match api().delete_post(&current, id).await {
                Ok(()) => {
                    action_error.set(None);
                    posts.restart();
                }
                Err(BlogClientError::Unauthorized) => {
                    sign_out(session);
                    navigator.push(Route::Login {});
                }
                Err(e) => action_error.set(Some(e.to_string())),
            }
        });
    };

    rsx! {
        div { class: "page",
            h1 { "All Posts" }

            div { class: "filters",
                select {
                    onchange: move |evt| status_filter.set(PostStatus::parse(&evt.value())),
                    option { value: "", "Any status" }
                    option { value: "draft", "Draft" }
                    option { value: "published", "Published" }
                }
                input {
                    r#type: "text",
                    placeholder: "Author",
                    value: "{author_filter}",
                    oninput: move |evt| author_filter.set(evt.value()),
                }
                input {
                    r#type: "search",
                    placeholder: "Search title or content",
                    value: "{search_filter}",
                    oninput: move |evt| search_filter.set(evt.value()),
                }
            }

            if let Some(message) = action_error() {
                p { class: "error", "{message}" }
            }

            match posts.read().as_ref() {
                Some(Ok(list)) if !list.is_empty() => rsx! {
                    div { class: "post-grid",
                        for post in list.iter().cloned() {
                            article { key: "{post.id}", class: "card",
                                Link { to: Route::PostDetail { id: post.id },
                                    h2 { "{post.title}" }
                                }
                                p { class: "meta",
                                    span { class: "badge {post.status}", "{post.status}" }
                                    " by {post.author} · {display_time(&post.created_at)}"
                                }
                                p { class: "excerpt", "{post.content.chars().take(150).collect::<String>()}" }
                                if session().is_authenticated() {
                                    div { class: "actions",
                                        Link { to: Route::EditPost { id: post.id }, class: "btn", "Edit" }
                                        button {
                                            class: "btn danger",
                                            onclick: move |_| on_delete(post.id),
                                            "Delete"
                                        }
                                    }
                                }
                            }
                        }
                    }
                },
                Some(Ok(_)) => rsx! { p { class: "muted", "No posts yet." } },
                Some(Err(BlogClientError::Unauthorized)) => rsx! {
                    p { class: "muted",
                        "Posts are only visible to members. "
                        Link { to: Route::Login {}, "Log in" }
                    }
                },
                Some(Err(e)) => rsx! { p { class: "error", "Error: {e}" } },
                None => rsx! { p { class: "muted", "Loading posts..." } },
            }
        }
    }
}

#[component]
fn PostDetail(id: i64) -> Element {
    let session = use_session();
    let navigator = use_navigator();
    let mut delete_error = use_signal(|| None::<String>);

    let post = use_resource(move || {
        let current = session();
        async move { api().get_post(&current, id).await }
    });

    let on_delete = move |_| {
        let current = session();
        spawn(async move {
            match api().delete_post(&current, id).await {
                Ok(()) => {
                    navigator.push(Route::Posts {});
                }
                Err(BlogClientError::Unauthorized) => {
                    sign_out(session);
                    navigator.push(Route::Login {});
                }
                Err(e) => delete_error.set(Some(e.to_string())),
            }
        });
    };

    rsx! {
        article { class: "page",
            match post.read().as_ref() {
                Some(Ok(post)) => rsx! {
                    div { class: "card detail",
                        h1 { "{post.title}" }
                        p { class: "meta",
                            span { class: "badge {post.status}", "{post.status}" }
                            " by {post.author}"
                        }
                        p { class: "meta",
                            "Created {display_time(&post.created_at)} · updated {display_time(&post.updated_at)}"
                        }
                        p { class: "content", "{post.content}" }

                        if let Some(message) = delete_error() {
                            p { class: "error", "{message}" }
                        }

                        if session().is_authenticated() {
                            div { class: "actions",
                                Link { to: Route::EditPost { id: post.id }, class: "btn primary", "Edit" }
                                button { class: "btn danger", onclick: on_delete, "Delete" }
                            }
                        }
                    }
                },
                Some(Err(BlogClientError::Unauthorized)) => rsx! {
                    p { class: "muted",
                        "Log in to read this post. "
                        Link { to: Route::Login {}, "Log in" }
                    }
                },
                Some(Err(e)) => rsx! { p { class: "error", "Error: {e}" } },
                None => rsx! { p { class: "muted", "Loading..." } },
            }
        }
    }
}

/// Title, content, author and status inputs shared by the create and edit pages.
#[component]
fn PostForm(
    #[props(into)] heading: String,
    #[props(into)] submit_label: String,
    initial: PostDraft,
    errors: FieldErrors,
    busy: bool,
    cancel_to: Route,
    on_submit: EventHandler<PostDraft>,
) -> Element {
    let mut draft = use_signal(|| initial.clone());

    rsx! {
        div { class: "page",
            form {
                class: "card form",
                onsubmit: move |evt: FormEvent| {
                    evt.prevent_default();
                    on_submit.call(draft());
                },
                h1 { "{heading}" }

                label { "Title" }
                input {
                    r#type: "text",
                    value: "{draft.read().title}",
                    oninput: move |evt| draft.write().title = evt.value(),
                }
                FieldError { errors: errors.clone(), field: "title" }

                label { "Content" }
                textarea {
                    value: "{draft.read().content}",
                    oninput: move |evt| draft.write().content = evt.value(),
                }
                FieldError { errors: errors.clone(), field: "content" }

                label { "Author" }
                input {
                    r#type: "text",
                    value: "{draft.read().author}",
                    oninput: move |evt| draft.write().author = evt.value(),
                }
                FieldError { errors: errors.clone(), field: "author" }

                label { "Status" }
                select {
                    value: "{draft.read().status}",
                    onchange: move |evt| {
                        if let Some(status) = PostStatus::parse(&evt.value()) {
                            draft.write().status = status;
                        }
                    },
                    option { value: "draft", "Draft" }
                    option { value: "published", "Published" }
                }
                FieldError { errors: errors.clone(), field: "status" }

                div { class: "actions",
                    Link { to: cancel_to, class: "btn", "Cancel" }
                    button { class: "btn primary", r#type: "submit", disabled: busy, "{submit_label}" }
                }
            }
        }
    }
}

#[component]
fn CreatePost() -> Element {
    let session = use_session();
    let navigator = use_navigator();
    let mut errors = use_signal(FieldErrors::new);
    let mut failure = use_signal(|| None::<String>);
    let mut busy = use_signal(|| false);

    if !session().is_authenticated() {
        navigator.push(Route::Login {});
        return rsx! { "Redirecting to login..." };
    }

    let on_submit = move |draft: PostDraft| {
        let current = session();
        busy.set(true);
        spawn(async move {
            match api().create_post(&current, &draft).await {
                Ok(post) => {
                    navigator.push(Route::PostDetail { id: post.id });
                }
                Err(BlogClientError::Unauthorized) => {
                    sign_out(session);
                    navigator.push(Route::Login {});
                }
                Err(e) => {
                    errors.set(e.field_errors());
                    failure.set(Some(e.to_string()));
                }
            }
            busy.set(false);
        });
    };

    rsx! {
        if let Some(message) = failure() {
            p { class: "error banner", "{message}" }
        }
        PostForm {
            heading: "Create New Post",
            submit_label: "Create Post",
            initial: PostDraft::default(),
            errors: errors(),
            busy: busy(),
            cancel_to: Route::Posts {},
            on_submit,
        }
    }
}

#[component]
fn EditPost(id: i64) -> Element {
    let session = use_session();
    let navigator = use_navigator();
    let mut errors = use_signal(FieldErrors::new);
    let mut failure = use_signal(|| None::<String>);
    let mut busy = use_signal(|| false);

    let post = use_resource(move || {
        let current = session();
        async move { api().get_post(&current, id).await }
    });

    if !session().is_authenticated() {
        navigator.push(Route::Login {});
        return rsx! { "Redirecting to login..." };
    }

    let on_submit = move |draft: PostDraft| {
        let current = session();
        busy.set(true);
        spawn(async move {
            match api().update_post(&current, id, &draft).await {
                Ok(_) => {
                    navigator.push(Route::PostDetail { id });
                }
                Err(BlogClientError::Unauthorized) => {
                    sign_out(session);
                    navigator.push(Route::Login {});
                }
                Err(e) => {
                    errors.set(e.field_errors());
                    failure.set(Some(e.to_string()));
                }
            }
            busy.set(false);
        });
    };

    let loaded = post.read().as_ref().map(|result| match result {
        Ok(post) => Ok(PostDraft::from(post)),
        Err(e) => Err(e.to_string()),
    });

    match loaded {
        Some(Ok(initial)) => rsx! {
            if let Some(message) = failure() {
                p { class: "error banner", "{message}" }
            }
            PostForm {
                heading: "Edit Post",
                submit_label: "Save Changes",
                initial,
                errors: errors(),
                busy: busy(),
                cancel_to: Route::PostDetail { id },
                on_submit,
            }
        },
        Some(Err(message)) => rsx! {
            div { class: "page",
                p { class: "error", "{message}" }
                Link { to: Route::Posts {}, class: "btn", "Back to posts" }
            }
        },
        None => rsx! { p { class: "muted", "Loading..." } },
    }
}

#[component]
fn Login() -> Element {
    let session = use_session();
    let navigator = use_navigator();
    let mut email = use_signal(String::new);
    let mut password = use_signal(String::new);
    let mut errors = use_signal(FieldErrors::new);
    let mut failure = use_signal(|| None::<String>);

    let on_submit = move |evt: FormEvent| {
        evt.prevent_default();
        let (email, password) = (email(), password());
        spawn(async move {
            match api().login(&email, &password).await {
                Ok(auth) => {
                    sign_in(session, auth);
                    navigator.push(Route::Posts {});
                }
                Err(e) => {
                    errors.set(e.field_errors());
                    failure.set(Some(e.to_string()));
                }
            }
        });
    };

    rsx! {
        div { class: "page narrow",
            form { class: "card form", onsubmit: on_submit,
                h1 { "Log in" }

                if let Some(message) = failure() {
                    p { class: "error", "{message}" }
                }

                label { "Email" }
                input {
                    r#type: "email",
                    value: "{email}",
                    oninput: move |evt| email.set(evt.value()),
                }
                FieldError { errors: errors(), field: "email" }

                label { "Password" }
                input {
                    r#type: "password",
                    value: "{password}",
                    oninput: move |evt| password.set(evt.value()),
                }
                FieldError { errors: errors(), field: "password" }

                button { class: "btn primary", r#type: "submit", "Log in" }
                p { class: "muted",
                    Link { to: Route::Register {}, "No account yet? Register" }
                }
            }
        }
    }
}

#[component]
fn Register() -> Element {
    let session = use_session();
    let navigator = use_navigator();
    let mut name = use_signal(String::new);
    let mut email = use_signal(String::new);
    let mut password = use_signal(String::new);
    let mut confirmation = use_signal(String::new);
    let mut errors = use_signal(FieldErrors::new);
    let mut failure = use_signal(|| None::<String>);

    let on_submit = move |evt: FormEvent| {
        evt.prevent_default();
        let (name, email, password, confirmation) = (name(), email(), password(), confirmation());
        spawn(async move {
            match api().register(&name, &email, &password, &confirmation).await {
                Ok(auth) => {
                    sign_in(session, auth);
                    navigator.push(Route::Posts {});
                }
                Err(e) => {
                    errors.set(e.field_errors());
                    failure.set(Some(e.to_string()));
                }
            }
        });
    };

    rsx! {
        div { class: "page narrow",
            form { class: "card form", onsubmit: on_submit,
                h1 { "Create account" }

                if let Some(message) = failure() {
                    p { class: "error", "{message}" }
                }

                label { "Name" }
                input {
                    r#type: "text",
                    value: "{name}",
                    oninput: move |evt| name.set(evt.value()),
                }
                FieldError { errors: errors(), field: "name" }

                label { "Email" }
                input {
                    r#type: "email",
                    value: "{email}",
                    oninput: move |evt| email.set(evt.value()),
                }
                FieldError { errors: errors(), field: "email" }

                label { "Password" }
                input {
                    r#type: "password",
                    value: "{password}",
                    oninput: move |evt| password.set(evt.value()),
                }
                FieldError { errors: errors(), field: "password" }

                label { "Confirm password" }
                input {
                    r#type: "password",
                    value: "{confirmation}",
                    oninput: move |evt| confirmation.set(evt.value()),
                }

                button { class: "btn primary", r#type: "submit", "Create Account" }
                p { class: "muted",
                    Link { to: Route::Login {}, "Already have an account? Log in" }
                }
            }
        }
    }
}

#[component]
fn Navbar() -> Element {
    let session = use_session();
    let navigator = use_navigator();
    let user_name = session().user.map(|user| user.name);

    let on_logout = move |_| {
        let current = session();
        // The local session is dropped whether or not the server call succeeds.
        sign_out(session);
        navigator.push(Route::Login {});
        spawn(async move {
            if let Err(e) = api().logout(&current).await {
                warn!("logout request failed: {e}");
            }
        });
    };

    rsx! {
        nav { class: "navbar",
            div { class: "nav-left",
                Link { to: Route::Posts {}, class: "brand", "MyBlog" }
                if session().is_authenticated() {
                    Link { to: Route::CreatePost {}, "New Post" }
                }
            }
            div { class: "nav-right",
                if let Some(name) = user_name {
                    span { class: "muted", "{name}" }
                }
                if session().is_authenticated() {
                    button { class: "btn danger", onclick: on_logout, "Logout" }
                } else {
                    Link { to: Route::Login {}, class: "btn primary", "Login" }
                    Link { to: Route::Register {}, class: "btn", "Register" }
                }
            }
        }
        Outlet::<Route> {}
    }
}

#[component]
fn NotFound(segments: Vec<String>) -> Element {
    let path = segments.join("/");

    rsx! {
        div { class: "page",
            h1 { "Page not found" }
            p { class: "muted", "/{path}" }
            Link { to: Route::Posts {}, class: "btn", "Back to posts" }
        }
    }
}
