use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::app;
use tower::ServiceExt;

const PRIMARY: &str = "/route-management-service";
const NAVIGATOR: &str = "/navigator-service";

async fn body_text(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn xml_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/xml")
        .body(body.to_string())
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(String::new())
        .unwrap()
}

fn create_body(name: &str, from: (&str, f64, f64), to: (&str, f64, f64), distance: f64) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><RouteCreateRequest><name>{name}</name>\
         <coordinates><x>1</x><y>1</y></coordinates>\
         <fromLocation><name>{}</name><x>{}</x><y>{}</y></fromLocation>\
         <toLocation><name>{}</name><x>{}</x><y>{}</y></toLocation>\
         <distance>{distance}</distance></RouteCreateRequest>",
        from.0, from.1, from.2, to.0, to.1, to.2
    )
}

// --- list ---

#[tokio::test]
async fn list_routes_empty() {
    let resp = app()
        .oneshot(empty_request("GET", &format!("{PRIMARY}/routes")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()[http::header::CONTENT_TYPE],
        "application/xml"
    );
    let body = body_text(resp).await;
    assert!(body.starts_with("<?xml"));
    assert!(body.contains("<totalElements>0</totalElements>"));
    assert!(body.contains("<pageSize>10</pageSize>"));
}

#[tokio::test]
async fn list_rejects_invalid_filter_value() {
    let resp = app()
        .oneshot(empty_request(
            "GET",
            &format!("{PRIMARY}/routes?filter.distance.min=far"),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_text(resp).await;
    assert!(body.contains("<message>Invalid value for filter.distance.min: far</message>"));
}

// --- create ---

#[tokio::test]
async fn create_route_returns_201_with_echo() {
    let resp = app()
        .oneshot(xml_request(
            "POST",
            &format!("{PRIMARY}/routes"),
            &create_body("Morning run", ("Depot", 0.0, 0.0), ("Mill", 3.0, 4.0), 12.5),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = body_text(resp).await;
    assert!(body.contains("<route><id>1</id><name>Morning run</name>"));
    assert!(body.contains("<fromLocation><id>1</id><name>Depot</name>"));
    assert!(body.contains("<toLocation><id>2</id><name>Mill</name>"));
    assert!(body.contains("<creationDate>"));
}

#[tokio::test]
async fn create_route_validation_lists_details() {
    let resp = app()
        .oneshot(xml_request(
            "POST",
            &format!("{PRIMARY}/routes"),
            &create_body(" ", ("Depot", 0.0, 0.0), ("Mill", 3.0, 4.0), 0.5),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_text(resp).await;
    assert!(body.contains("<message>Validation failed</message>"));
    assert!(body.contains("<detail>name is blank</detail>"));
    assert!(body.contains("<detail>distance must be "));
}

#[tokio::test]
async fn create_route_malformed_xml_returns_400() {
    let resp = app()
        .oneshot(xml_request(
            "POST",
            &format!("{PRIMARY}/routes"),
            "<RouteCreateRequest><distance>far</distance></RouteCreateRequest>",
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- update / delete ---

#[tokio::test]
async fn update_route_not_found() {
    let resp = app()
        .oneshot(xml_request(
            "PUT",
            &format!("{PRIMARY}/routes/42"),
            "<RouteUpdateRequest><name>Nope</name><distance>5</distance></RouteUpdateRequest>",
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_route_not_found() {
    let resp = app()
        .oneshot(empty_request("DELETE", &format!("{PRIMARY}/routes/42")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- analytics ---

#[tokio::test]
async fn greater_than_requires_min_distance() {
    let resp = app()
        .oneshot(empty_request("GET", &format!("{PRIMARY}/routes/distance/greater-than")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- availability ---

#[tokio::test]
async fn both_services_publish_wadl() {
    for prefix in [PRIMARY, NAVIGATOR] {
        let resp = app()
            .oneshot(empty_request("GET", &format!("{prefix}/application.wadl")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK, "{prefix}");
    }
}

// --- navigator ---

#[tokio::test]
async fn navigator_rejects_same_location() {
    let resp = app()
        .oneshot(empty_request("POST", &format!("{NAVIGATOR}/navigator/route/add/1/1/10")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn navigator_unknown_location_returns_404() {
    let resp = app()
        .oneshot(empty_request("POST", &format!("{NAVIGATOR}/navigator/route/add/1/2/10")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn find_between_without_routes_returns_404() {
    let resp = app()
        .oneshot(empty_request("GET", &format!("{NAVIGATOR}/navigator/routes/1/2/distance")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn find_between_unknown_sort_returns_400() {
    let resp = app()
        .oneshot(empty_request("GET", &format!("{NAVIGATOR}/navigator/routes/1/2/colour")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- full lifecycle across both services ---

#[tokio::test]
async fn route_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    macro_rules! call {
        ($req:expr) => {
            ServiceExt::ready(&mut app).await.unwrap().call($req).await.unwrap()
        };
    }

    // create two routes between the same pair of locations
    let resp = call!(xml_request(
        "POST",
        &format!("{PRIMARY}/routes"),
        &create_body("Long haul", ("Depot", 0.0, 0.0), ("Harbour", 6.0, 8.0), 42.5),
    ));
    assert_eq!(resp.status(), StatusCode::CREATED);
    let resp = call!(xml_request(
        "POST",
        &format!("{PRIMARY}/routes"),
        &create_body("Short hop", ("Depot", 0.0, 0.0), ("Harbour", 6.0, 8.0), 11.0),
    ));
    assert_eq!(resp.status(), StatusCode::CREATED);

    // filtered and sorted list
    let resp = call!(empty_request(
        "GET",
        &format!("{PRIMARY}/routes?page=0&size=1&filter.fromName=dep&sort=distance,asc"),
    ));
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_text(resp).await;
    assert!(body.contains("<name>Short hop</name>"));
    assert!(!body.contains("<name>Long haul</name>"));
    assert!(body.contains("<totalElements>2</totalElements>"));
    assert!(body.contains("<totalPages>2</totalPages>"));

    // update
    let resp = call!(xml_request(
        "PUT",
        &format!("{PRIMARY}/routes/2"),
        "<RouteUpdateRequest><name>Quick hop</name><distance>12</distance></RouteUpdateRequest>",
    ));
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("<name>Quick hop</name>"));

    // analytics
    let resp = call!(empty_request("GET", &format!("{PRIMARY}/routes/distance/sum")));
    let body = body_text(resp).await;
    assert!(body.contains("<totalSum>54.5</totalSum>"));
    assert!(body.contains("<routeCount>2</routeCount>"));

    let resp = call!(empty_request(
        "GET",
        &format!("{PRIMARY}/routes/distance/greater-than?minDistance=20"),
    ));
    let body = body_text(resp).await;
    assert!(body.contains("<count>1</count>"));
    assert!(body.contains("<name>Long haul</name>"));

    let resp = call!(empty_request("GET", &format!("{PRIMARY}/routes/distance/group")));
    let body = body_text(resp).await;
    assert!(body.contains("<totalGroups>2</totalGroups>"));
    assert!(body.contains("<percentage>50</percentage>"));

    // navigator: Depot is location 1, Harbour is 2
    let resp = call!(empty_request("POST", &format!("{NAVIGATOR}/navigator/route/add/2/1/15")));
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = body_text(resp).await;
    assert!(body.contains("<createdBy>navigator-service</createdBy>"));
    assert!(body.contains("<name>Маршрут Harbour - Depot</name>"));

    let resp = call!(empty_request("POST", &format!("{NAVIGATOR}/navigator/route/add/2/1/15")));
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = call!(empty_request("GET", &format!("{NAVIGATOR}/navigator/routes/1/2/name")));
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_text(resp).await;
    let long = body.find("Long haul").unwrap();
    let quick = body.find("Quick hop").unwrap();
    assert!(long < quick);

    // delete
    let resp = call!(empty_request("DELETE", &format!("{PRIMARY}/routes/1")));
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    let resp = call!(empty_request("DELETE", &format!("{PRIMARY}/routes/1")));
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
