/// Untyped JSON response of the OpenML REST API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenericResponse(serde_json::Value);

impl GenericResponse {
    #[inline(always)]
    pub fn look_up<'a>(&'a self, p: &str) -> Option<&'a serde_json::Value> {
        self.0.pointer(p)
    }

    /// location of the ARFF file in a data set description
    pub fn download_url(&self) -> Option<&str> {
        self.look_up("/data_set_description/url")
            .and_then(|v| v.as_str())
    }
}

#[test]
fn download_url_from_description() {
    let response: GenericResponse = serde_json::from_value(json!({
        "data_set_description": {
            "id": "41214",
            "name": "freMTPL2freq",
            "url": "https://www.openml.org/data/v1/download/20649148/freMTPL2freq.arff"
        }
    }))
    .unwrap();

    assert_eq!(
        response.download_url(),
        Some("https://www.openml.org/data/v1/download/20649148/freMTPL2freq.arff")
    );

    let empty: GenericResponse = serde_json::from_value(json!({})).unwrap();
    assert_eq!(empty.download_url(), None);
}
