//! Thrift JSON protocol message envelope.
//!
//! A message is `[1, "<method>", <type>, <seqid>, {<struct>}]`. Call arguments
//! are positional fields `"1"`, `"2"`, ... holding pre-encoded values; absent
//! optional arguments are simply left out. A reply carries the method result
//! in field `"0"`, an exception reply carries `{message, type}`.

use serde_json::{json, Map, Value};

use super::{Response, ResponseCode, ResponseDetail, RpcError};

const VERSION: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Call,
    Reply,
    Exception,
    Oneway,
}

impl MessageType {
    fn code(self) -> i64 {
        match self {
            MessageType::Call => 1,
            MessageType::Reply => 2,
            MessageType::Exception => 3,
            MessageType::Oneway => 4,
        }
    }

    fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(MessageType::Call),
            2 => Some(MessageType::Reply),
            3 => Some(MessageType::Exception),
            4 => Some(MessageType::Oneway),
            _ => None,
        }
    }
}

fn protocol(msg: impl Into<String>) -> RpcError {
    RpcError::Protocol(msg.into())
}

fn encode(name: &str, kind: MessageType, seqid: i32, body: Value) -> Vec<u8> {
    json!([VERSION, name, kind.code(), seqid, body])
        .to_string()
        .into_bytes()
}

/// Decoded envelope header and body.
fn decode(bytes: &[u8]) -> Result<(String, MessageType, i32, Map<String, Value>), RpcError> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| protocol(format!("invalid JSON: {}", e)))?;
    let parts = value
        .as_array()
        .filter(|p| p.len() == 5)
        .ok_or_else(|| protocol("message is not a 5-element array"))?;

    if parts[0].as_i64() != Some(VERSION) {
        return Err(protocol(format!("unsupported message version {}", parts[0])));
    }
    let name = parts[1]
        .as_str()
        .ok_or_else(|| protocol("message name is not a string"))?
        .to_string();
    let kind = parts[2]
        .as_i64()
        .and_then(MessageType::from_code)
        .ok_or_else(|| protocol(format!("unknown message type {}", parts[2])))?;
    let seqid = parts[3]
        .as_i64()
        .and_then(|s| i32::try_from(s).ok())
        .ok_or_else(|| protocol("sequence id is not an i32"))?;
    let body = parts[4]
        .as_object()
        .cloned()
        .ok_or_else(|| protocol("message body is not a struct"))?;
    Ok((name, kind, seqid, body))
}

pub fn encode_call(method: &str, seqid: i32, args: &[Value]) -> Vec<u8> {
    let fields: Map<String, Value> = args
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_null())
        .map(|(i, v)| ((i + 1).to_string(), v.clone()))
        .collect();
    encode(method, MessageType::Call, seqid, Value::Object(fields))
}

/// Method name, sequence id and positional arguments of a call message
/// (omitted optionals come back as `Null`).
pub fn decode_call(bytes: &[u8]) -> Result<(String, i32, Vec<Value>), RpcError> {
    let (name, kind, seqid, body) = decode(bytes)?;
    if !matches!(kind, MessageType::Call | MessageType::Oneway) {
        return Err(protocol(format!("expected a call, got {:?}", kind)));
    }
    // Field ids are positive i16s, which bounds how many gaps get filled.
    let mut len = 0usize;
    for key in body.keys() {
        let id = key
            .parse::<i16>()
            .ok()
            .filter(|id| *id > 0)
            .ok_or_else(|| protocol(format!("invalid argument field id {:?}", key)))?;
        len = len.max(id as usize);
    }
    let args = (1..=len)
        .map(|i| body.get(&i.to_string()).cloned().unwrap_or(Value::Null))
        .collect();
    Ok((name, seqid, args))
}

pub fn encode_reply(method: &str, seqid: i32, response: &Response) -> Vec<u8> {
    let mut fields = Map::new();
    fields.insert(
        "1".to_string(),
        json!({ "i32": response.response_code.as_i32() }),
    );
    if let Some(result) = &response.result {
        fields.insert("3".to_string(), json!({ "rec": result }));
    }
    if let Some(info) = &response.server_info {
        fields.insert("5".to_string(), json!({ "rec": info }));
    }
    if !response.details.is_empty() {
        let mut list = vec![json!("rec"), json!(response.details.len())];
        list.extend(
            response
                .details
                .iter()
                .map(|d| json!({ "1": { "str": d.message } })),
        );
        fields.insert("6".to_string(), json!({ "lst": list }));
    }
    encode(
        method,
        MessageType::Reply,
        seqid,
        json!({ "0": { "rec": Value::Object(fields) } }),
    )
}

pub fn encode_exception(method: &str, seqid: i32, kind: i32, message: &str) -> Vec<u8> {
    encode(
        method,
        MessageType::Exception,
        seqid,
        json!({ "1": { "str": message }, "2": { "i32": kind } }),
    )
}

/// Decode the reply to call `method`/`seqid`.
pub fn decode_reply(bytes: &[u8], method: &str, seqid: i32) -> Result<Response, RpcError> {
    let (name, kind, got_seqid, body) = decode(bytes)?;
    if name != method {
        return Err(protocol(format!("reply for {} while calling {}", name, method)));
    }
    if got_seqid != seqid {
        return Err(protocol(format!(
            "out of order reply: expected seqid {}, got {}",
            seqid, got_seqid
        )));
    }
    match kind {
        MessageType::Reply => {}
        MessageType::Exception => {
            let message = body
                .get("1")
                .and_then(|f| f.get("str"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let kind = body
                .get("2")
                .and_then(|f| f.get("i32"))
                .and_then(Value::as_i64)
                .unwrap_or(0) as i32;
            return Err(RpcError::Application { kind, message });
        }
        other => return Err(protocol(format!("expected a reply, got {:?}", other))),
    }

    let rec = body
        .get("0")
        .and_then(|f| f.get("rec"))
        .and_then(Value::as_object)
        .ok_or_else(|| protocol(format!("{} reply has no result", method)))?;
    decode_response(rec)
}

fn decode_response(rec: &Map<String, Value>) -> Result<Response, RpcError> {
    let code = rec
        .get("1")
        .and_then(|f| f.get("i32"))
        .and_then(Value::as_i64)
        .ok_or_else(|| protocol("response has no responseCode"))?;
    let mut response = Response::new(ResponseCode::from_i32(code as i32));
    response.result = rec.get("3").and_then(|f| f.get("rec")).cloned();
    response.server_info = rec.get("5").and_then(|f| f.get("rec")).cloned();

    if let Some(list) = rec
        .get("6")
        .and_then(|f| f.get("lst"))
        .and_then(Value::as_array)
    {
        // ["rec", <count>, elem...]
        response.details = list
            .iter()
            .skip(2)
            .map(|d| ResponseDetail {
                message: d
                    .get("1")
                    .and_then(|f| f.get("str"))
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            })
            .collect();
    }
    Ok(response)
}
