//! Forest fire danger point service of the public open-data portal.
//!
//! The portal answers with XML by default; responses are reshaped into
//! tab-indented JSON, which is the canonical payload served and persisted
//! for the `/forestPoint` route.

use crate::cache::Fingerprint;
use crate::error::{GatewayError, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

/// Result codes the portal uses for a successful call.
const SUCCESS_CODES: [&str; 2] = ["00", "0"];

/// Query parameters accepted by `/forestPoint`. Missing values are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ForestPointQuery {
    #[serde(rename = "pageNo", default)]
    pub page_no: String,
    #[serde(rename = "numOfRows", default)]
    pub num_of_rows: String,
    #[serde(rename = "_type", default)]
    pub data_type: String,
    #[serde(rename = "excludeForecast", default)]
    pub exclude_forecast: String,
}

impl ForestPointQuery {
    /// Fingerprint over the service key and every query parameter.
    pub fn fingerprint(&self, service_key: &str) -> Fingerprint {
        Fingerprint::build([
            ("serviceKey", service_key),
            ("pageNo", self.page_no.as_str()),
            ("numOfRows", self.num_of_rows.as_str()),
            ("_type", self.data_type.as_str()),
            ("excludeForecast", self.exclude_forecast.as_str()),
        ])
    }

    /// Query string pairs for the portal call.
    ///
    /// Keys are often handed out already percent-encoded; they are decoded
    /// here so the HTTP client encodes them exactly once.
    pub fn upstream_params(&self, service_key: &str) -> Vec<(String, String)> {
        let key = urlencoding::decode(service_key)
            .map(|k| k.into_owned())
            .unwrap_or_else(|_| service_key.to_string());

        vec![
            ("serviceKey".to_string(), key),
            ("pageNo".to_string(), self.page_no.clone()),
            ("numOfRows".to_string(), self.num_of_rows.clone()),
            ("_type".to_string(), self.data_type.clone()),
            ("excludeForecast".to_string(), self.exclude_forecast.clone()),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "response")]
pub struct ForestPointResponse {
    #[serde(default)]
    pub header: Header,
    #[serde(default)]
    pub body: Body,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    #[serde(rename = "resultCode", default)]
    pub result_code: String,
    #[serde(rename = "resultMsg", default)]
    pub result_msg: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Body {
    #[serde(default)]
    pub items: Items,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Items {
    #[serde(default)]
    pub item: Vec<Item>,
}

/// One forecast point.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Item {
    pub analdate: String,
    pub area: String,
    pub d1: String,
    pub d2: String,
    pub d3: String,
    pub d4: String,
    pub domain: String,
    pub maxi: String,
    pub meanavg: String,
    pub mini: String,
    pub regioncode: String,
    pub searchcd: String,
    pub std: String,
}

/// Error envelope the portal gateway sends instead of `<response>` when a
/// call is refused before reaching the service (bad key, quota, outage).
#[derive(Debug, Default, Deserialize)]
struct ServiceErrorEnvelope {
    #[serde(rename = "cmmMsgHeader", default)]
    header: ServiceErrorHeader,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ServiceErrorHeader {
    #[serde(rename = "errMsg")]
    err_msg: String,
    #[serde(rename = "returnAuthMsg")]
    return_auth_msg: String,
    #[serde(rename = "returnReasonCode")]
    return_reason_code: String,
}

/// Transform a raw portal response into canonical JSON text.
///
/// XML must have a `<response>` root and is parsed into
/// [`ForestPointResponse`]; a JSON body (`_type=json`) is re-indented as-is.
/// Both forms must carry a successful `resultCode`, so error replies never
/// become payloads.
pub fn to_canonical_json(raw: &str) -> Result<String> {
    let trimmed = raw.trim_start();

    if trimmed.starts_with('{') {
        let value: serde_json::Value = serde_json::from_str(trimmed)
            .map_err(|e| GatewayError::Parse(format!("forest point JSON: {}", e)))?;
        let header = &value["response"]["header"];
        check_result_code(
            header["resultCode"].as_str().unwrap_or_default(),
            header["resultMsg"].as_str().unwrap_or_default(),
        )?;
        return to_tab_indented(&value);
    }

    match root_element(trimmed)?.as_str() {
        "response" => {}
        "OpenAPI_ServiceResponse" => {
            let envelope: ServiceErrorEnvelope = quick_xml::de::from_str(trimmed)
                .map_err(|e| GatewayError::Parse(format!("forest point XML: {}", e)))?;
            let header = envelope.header;
            return Err(GatewayError::Upstream(format!(
                "forest point service refused the call ({}): {} {}",
                header.return_reason_code, header.err_msg, header.return_auth_msg
            )));
        }
        other => {
            return Err(GatewayError::Parse(format!(
                "forest point XML: unexpected root element <{}>",
                other
            )))
        }
    }

    let response: ForestPointResponse = quick_xml::de::from_str(trimmed)
        .map_err(|e| GatewayError::Parse(format!("forest point XML: {}", e)))?;

    check_result_code(&response.header.result_code, &response.header.result_msg)?;

    to_tab_indented(&response)
}

fn check_result_code(code: &str, message: &str) -> Result<()> {
    if code.is_empty() {
        return Err(GatewayError::Parse(
            "forest point response has no resultCode".to_string(),
        ));
    }
    if !SUCCESS_CODES.contains(&code) {
        return Err(GatewayError::Upstream(format!(
            "forest point service returned {}: {}",
            code, message
        )));
    }
    Ok(())
}

/// Name of the document's first element.
fn root_element(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return Ok(String::from_utf8_lossy(e.name().as_ref()).into_owned())
            }
            Ok(Event::Eof) => {
                return Err(GatewayError::Parse(
                    "forest point XML: no root element".to_string(),
                ))
            }
            Ok(_) => {}
            Err(e) => return Err(GatewayError::Parse(format!("forest point XML: {}", e))),
        }
    }
}

fn to_tab_indented<T: Serialize>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    String::from_utf8(buf).map_err(|e| GatewayError::Internal(e.to_string()))
}
