use placescout_client::GooglePlacesClient;
use serde_json::{Value, json};
use wiremock::MockServer;

pub const TEST_KEY: &str = "test-key";

pub fn client(server: &MockServer) -> GooglePlacesClient {
    GooglePlacesClient::with_base_url(TEST_KEY, &server.uri()).unwrap()
}

/// A text search body with one result per id, each named `Name <id>`.
pub fn search_body(ids: &[&str], next_page_token: Option<&str>) -> Value {
    let results: Vec<Value> = ids
        .iter()
        .map(|id| json!({"place_id": id, "name": format!("Name {id}")}))
        .collect();
    let mut body = json!({"status": "OK", "results": results});
    if let Some(token) = next_page_token {
        body["next_page_token"] = json!(token);
    }
    body
}

pub fn status_body(status: &str) -> Value {
    json!({"status": status, "results": [], "error_message": format!("{status} from test")})
}
