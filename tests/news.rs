mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use pretty_assertions::assert_eq;

use braniac::db::ContentRepository;
use braniac::models::{News, NewsForm};
use common::{get_page, init_app, location, login, TestContext};

async fn seed_news(ctx: &TestContext, count: usize) -> Vec<News> {
    let mut created = Vec::new();
    for n in 1..=count {
        let form = NewsForm {
            title: format!("News {}", n),
            preambule: format!("Preambule {}", n),
            body: format!("Body {}", n),
        };
        created.push(ctx.store.create_news(&form).await.unwrap());
    }
    created
}

#[actix_rt::test]
async fn test_news_list_is_paginated() {
    let ctx = TestContext::new();
    let app = init_app(&ctx).await;
    seed_news(&ctx, 7).await;

    let (status, page, _) = get_page(&app, "/news/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["view"], "mainapp:news");
    assert_eq!(page["context"]["object_list"].as_array().unwrap().len(), 5);
    assert_eq!(page["context"]["object_list"][0]["title"], "News 7");
    assert_eq!(page["context"]["page"]["num_pages"], 2);

    let (status, page, _) = get_page(&app, "/news/?page=2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["context"]["object_list"].as_array().unwrap().len(), 2);

    let (status, _, _) = get_page(&app, "/news/?page=3", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_page_open_detail() {
    let ctx = TestContext::new();
    let app = init_app(&ctx).await;
    let news = seed_news(&ctx, 1).await.remove(0);

    let (status, page, _) = get_page(&app, &format!("/news/{}/", news.id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["context"]["object"]["title"], "News 1");

    let (status, _, _) = get_page(&app, "/news/999/", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_anonymous_is_redirected_to_login() {
    let ctx = TestContext::new();
    let app = init_app(&ctx).await;
    let news = seed_news(&ctx, 1).await.remove(0);

    for uri in [
        "/news/create/".to_string(),
        format!("/news/{}/update/", news.id),
        format!("/news/{}/delete/", news.id),
    ] {
        let req = test::TestRequest::get().uri(&uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND, "GET {}", uri);
        assert!(location(&resp).starts_with("/authapp/login/?next="));
    }

    let req = test::TestRequest::post()
        .uri(&format!("/news/{}/delete/", news.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);

    let unchanged = ctx.store.find_news(news.id).await.unwrap().unwrap();
    assert!(!unchanged.deleted);
}

#[actix_rt::test]
async fn test_regular_user_is_forbidden() {
    let ctx = TestContext::new();
    let app = init_app(&ctx).await;
    ctx.create_user("student", false).await;
    let cookie = login(&app, "student").await;

    let (status, _, _) = get_page(&app, "/news/create/", Some(&cookie)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_rt::test]
async fn test_regular_user_cannot_change_news() {
    let ctx = TestContext::new();
    let app = init_app(&ctx).await;
    let news = seed_news(&ctx, 1).await.remove(0);
    ctx.create_user("student", false).await;
    let cookie = login(&app, "student").await;

    let req = test::TestRequest::post()
        .uri("/news/create/")
        .cookie(cookie.clone())
        .set_form(&[("title", "Spam"), ("preambule", "Spam"), ("body", "Spam")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri(&format!("/news/{}/update/", news.id))
        .cookie(cookie.clone())
        .set_form(&[("title", "Defaced"), ("preambule", "Defaced"), ("body", "Defaced")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri(&format!("/news/{}/delete/", news.id))
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let unchanged = ctx.store.find_news(news.id).await.unwrap().unwrap();
    assert_eq!(unchanged.title, "News 1");
    assert!(!unchanged.deleted);
    assert_eq!(ctx.store.count_news().await.unwrap(), 1);
}

#[actix_rt::test]
async fn test_create_in_web() {
    let ctx = TestContext::new();
    let app = init_app(&ctx).await;
    ctx.create_user("admin", true).await;
    let cookie = login(&app, "admin").await;

    let (status, page, cookie) = get_page(&app, "/news/create/", Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["view"], "mainapp:news_create");

    let counter_before = ctx.store.count_news().await.unwrap();
    let req = test::TestRequest::post()
        .uri("/news/create/")
        .cookie(cookie.unwrap())
        .set_form(&[
            ("title", "NewTestNews001"),
            ("preambule", "NewTestNews001"),
            ("body", "NewTestNews001"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/news/");
    assert!(ctx.store.count_news().await.unwrap() > counter_before);
}

#[actix_rt::test]
async fn test_create_with_empty_title_rerenders() {
    let ctx = TestContext::new();
    let app = init_app(&ctx).await;
    ctx.create_user("admin", true).await;
    let cookie = login(&app, "admin").await;

    let req = test::TestRequest::post()
        .uri("/news/create/")
        .cookie(cookie)
        .set_form(&[("title", ""), ("preambule", "p"), ("body", "b")])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let page: serde_json::Value = test::read_body_json(resp).await;
    assert!(page["context"]["errors"].get("title").is_some());
    assert_eq!(page["context"]["form"]["preambule"], "p");
    assert_eq!(ctx.store.count_news().await.unwrap(), 0);
}

#[actix_rt::test]
async fn test_update_in_web() {
    let ctx = TestContext::new();
    let app = init_app(&ctx).await;
    let news = seed_news(&ctx, 1).await.remove(0);
    ctx.create_user("admin", true).await;
    let cookie = login(&app, "admin").await;

    let uri = format!("/news/{}/update/", news.id);
    let (status, page, cookie) = get_page(&app, &uri, Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["context"]["form"]["title"], "News 1");

    let new_title = "NewTestTitle001";
    assert_ne!(news.title, new_title);
    let req = test::TestRequest::post()
        .uri(&uri)
        .cookie(cookie.unwrap())
        .set_form(&[
            ("title", new_title),
            ("preambule", news.preambule.as_str()),
            ("body", news.body.as_str()),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/news/{}/", news.id));
    let refreshed = ctx.store.find_news(news.id).await.unwrap().unwrap();
    assert_eq!(refreshed.title, new_title);
}

#[actix_rt::test]
async fn test_delete_in_web() {
    let ctx = TestContext::new();
    let app = init_app(&ctx).await;
    let news = seed_news(&ctx, 1).await.remove(0);
    ctx.create_user("admin", true).await;
    let cookie = login(&app, "admin").await;

    let uri = format!("/news/{}/delete/", news.id);
    let (status, page, cookie) = get_page(&app, &uri, Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["view"], "mainapp:news_delete");

    let req = test::TestRequest::post()
        .uri(&uri)
        .cookie(cookie.unwrap())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/news/");

    // still in storage, hidden from the site
    let deleted = ctx.store.find_news(news.id).await.unwrap().unwrap();
    assert!(deleted.deleted);
    let (status, _, _) = get_page(&app, &format!("/news/{}/", news.id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, page, _) = get_page(&app, "/news/", None).await;
    assert!(page["context"]["object_list"].as_array().unwrap().is_empty());
}
