use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde_json::json;

fn fetched(status: u16, body: Option<crate::client::Payload>) -> crate::client::Fetched {
    crate::client::Fetched {
        status: StatusCode::from_u16(status).unwrap(),
        headers: HeaderMap::new(),
        body,
    }
}

#[test]
fn status_report_matches_output_area_shape() {
    let res = fetched(
        200,
        Some(crate::client::Payload::Json(json!({"status": "healthy"}))),
    );
    let report: serde_json::Value = serde_json::from_str(&res.status_report()).unwrap();
    assert_eq!(report, json!({"status": 200, "body": {"status": "healthy"}}));
    assert!(res.status_report().contains("\n  \"status\": 200"));
}

#[test]
fn status_report_keeps_status_first_and_server_key_order() {
    let body = crate::client::decode_body(
        "application/json",
        br#"{"id":1,"email":"a@b.lt","role":"user"}"#,
    );
    let res = fetched(200, body);
    assert_eq!(
        res.status_report(),
        "{\n  \"status\": 200,\n  \"body\": {\n    \"id\": 1,\n    \"email\": \"a@b.lt\",\n    \"role\": \"user\"\n  }\n}"
    );
}

#[test]
fn status_report_with_null_body() {
    let res = fetched(204, None);
    let report: serde_json::Value = serde_json::from_str(&res.status_report()).unwrap();
    assert_eq!(report, json!({"status": 204, "body": null}));
}

#[test]
fn text_body_becomes_json_string_in_report() {
    let res = fetched(
        401,
        Some(crate::client::Payload::Text("Invalid credentials\n".to_string())),
    );
    assert_eq!(res.body_value(), json!("Invalid credentials\n"));
    assert!(!res.ok());
}

#[test]
fn decoded_spot_list_renders_one_card_per_record() {
    let res = fetched(
        200,
        Some(crate::client::Payload::Json(json!([
            {"id": 1, "name": "Karoliniskiu landscape reserve", "category": "Gamta", "address": "Vilnius", "image_url": "https://img/1.jpg"},
            {"id": 2, "name": "Pull-up bars", "category": "Lauko_treniruokliai", "address": "Pilaites pr. 10", "image_url": ""},
            {"id": 3, "name": "Old bunker", "category": "Slaptos_vietos", "address": "Somewhere"}
        ]))),
    );
    let spots = res.spots().unwrap();

    let mut container = crate::render::Container::new();
    crate::render::render_spots(&mut container, spots.clone());
    assert_eq!(container.len(), 3);
    for (card, spot) in container.cards().iter().zip(&spots) {
        assert_eq!(card.title, spot.name);
        assert_eq!(card.address, spot.address);
        let html = card.to_html();
        assert!(html.contains(&spot.name));
        assert!(html.contains(&spot.address));
    }
    assert_eq!(
        container.cards()[1].image_src,
        crate::render::PLACEHOLDER_IMAGE
    );
}

#[test]
fn non_array_body_is_not_a_spot_list() {
    let res = fetched(
        200,
        Some(crate::client::Payload::Json(json!({"error": "nope"}))),
    );
    assert!(res.spots().is_err());
}

#[test]
fn json_output_round_trips_spot_fields() {
    let spot = crate::model::Spot {
        id: 5,
        name: "Hill".to_string(),
        category: "Gamta".to_string(),
        address: "Pilaite".to_string(),
        image_url: Some("x.jpg".to_string()),
        ..Default::default()
    };
    let mut container = crate::render::Container::new();
    crate::render::render_spots(&mut container, vec![spot]);
    let out: serde_json::Value =
        serde_json::from_slice(&crate::render::render_json(&container)).unwrap();
    assert_eq!(
        out,
        json!([{"id": 5, "name": "Hill", "category": "Gamta", "address": "Pilaite", "image_url": "x.jpg"}])
    );
}

#[test]
fn every_category_label_round_trips_to_itself() {
    for category in crate::model::Category::ALL {
        assert_eq!(
            crate::model::Category::from_label(category.label()).unwrap(),
            category
        );
        assert_eq!(
            crate::model::Category::from_label(category.wire_key()).unwrap(),
            category
        );
    }
}
