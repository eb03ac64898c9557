//! XML-RPC encoding and decoding.
//!
//! Requests are written by hand; responses are parsed with `roxmltree`.
//! Integers outside the `i32` range are sent as `<i8>`, which the platform's
//! Apache XML-RPC stack accepts.

use std::collections::BTreeMap;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use roxmltree::{Document, Node};

use super::error::RpcError;
use super::method::MethodName;
use super::value::Value;

/// Serialises a `methodCall` document.
#[must_use]
pub fn encode_call(method: &MethodName, params: &[Value]) -> String {
    let mut out = String::from("<?xml version=\"1.0\"?><methodCall><methodName>");
    escape_into(&mut out, method.as_str());
    out.push_str("</methodName><params>");
    for param in params {
        out.push_str("<param>");
        encode_value(&mut out, param);
        out.push_str("</param>");
    }
    out.push_str("</params></methodCall>");
    out
}

fn encode_value(out: &mut String, value: &Value) {
    out.push_str("<value>");
    match value {
        Value::Nil => out.push_str("<nil/>"),
        Value::Bool(flag) => {
            out.push_str(if *flag {
                "<boolean>1</boolean>"
            } else {
                "<boolean>0</boolean>"
            });
        }
        Value::Int(number) => {
            let tag = if i32::try_from(*number).is_ok() {
                "int"
            } else {
                "i8"
            };
            out.push_str(&format!("<{tag}>{number}</{tag}>"));
        }
        Value::Double(number) => {
            out.push_str(&format!("<double>{number}</double>"));
        }
        Value::String(text) => {
            out.push_str("<string>");
            escape_into(out, text);
            out.push_str("</string>");
        }
        Value::DateTime(stamp) => {
            out.push_str("<dateTime.iso8601>");
            escape_into(out, stamp);
            out.push_str("</dateTime.iso8601>");
        }
        Value::Base64(bytes) => {
            out.push_str("<base64>");
            out.push_str(&STANDARD.encode(bytes));
            out.push_str("</base64>");
        }
        Value::Array(items) => {
            out.push_str("<array><data>");
            for item in items {
                encode_value(out, item);
            }
            out.push_str("</data></array>");
        }
        Value::Struct(members) => {
            out.push_str("<struct>");
            for (name, member) in members {
                out.push_str("<member><name>");
                escape_into(out, name);
                out.push_str("</name>");
                encode_value(out, member);
                out.push_str("</member>");
            }
            out.push_str("</struct>");
        }
    }
    out.push_str("</value>");
}

fn escape_into(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
}

/// Parses a `methodResponse` document.
///
/// # Errors
///
/// * [`RpcError::Fault`] when the response carries a `<fault>`.
/// * [`RpcError::Codec`] when the document is not valid XML-RPC.
pub fn decode_response(xml: &str) -> Result<Value, RpcError> {
    let document =
        Document::parse(xml).map_err(|error| RpcError::codec(format!("invalid XML: {error}")))?;
    let root = document.root_element();
    if !root.has_tag_name("methodResponse") {
        return Err(RpcError::codec(format!(
            "expected <methodResponse>, found <{}>",
            root.tag_name().name()
        )));
    }

    if let Some(fault) = child_element(root, "fault") {
        return Err(decode_fault(fault).unwrap_or_else(|malformed| malformed));
    }

    let Some(params) = child_element(root, "params") else {
        return Err(RpcError::codec("response has neither <params> nor <fault>"));
    };
    child_element(params, "param").map_or(Ok(Value::Nil), |param| {
        decode_value(required_child(param, "value")?)
    })
}

fn decode_fault(fault: Node<'_, '_>) -> Result<RpcError, RpcError> {
    let detail = decode_value(required_child(fault, "value")?)?;
    let code = detail
        .get("faultCode")
        .and_then(Value::as_i64)
        .ok_or_else(|| RpcError::codec("fault without integer faultCode"))?;
    let message = detail
        .get("faultString")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned();
    Ok(RpcError::Fault { code, message })
}

fn decode_value(node: Node<'_, '_>) -> Result<Value, RpcError> {
    let Some(typed) = node.children().find(Node::is_element) else {
        return Ok(Value::String(text_of(node)));
    };
    let text = || text_of(typed);
    match typed.tag_name().name() {
        "i4" | "int" | "i8" => text()
            .trim()
            .parse()
            .map(Value::Int)
            .map_err(|error| RpcError::codec(format!("bad integer: {error}"))),
        "boolean" => match text().trim() {
            "1" | "true" => Ok(Value::Bool(true)),
            "0" | "false" => Ok(Value::Bool(false)),
            other => Err(RpcError::codec(format!("bad boolean '{other}'"))),
        },
        "double" => text()
            .trim()
            .parse()
            .map(Value::Double)
            .map_err(|error| RpcError::codec(format!("bad double: {error}"))),
        "string" => Ok(Value::String(text())),
        "nil" => Ok(Value::Nil),
        "dateTime.iso8601" => Ok(Value::DateTime(text().trim().to_owned())),
        "base64" => {
            let compact: String = text().split_whitespace().collect();
            STANDARD
                .decode(compact)
                .map(Value::Base64)
                .map_err(|error| RpcError::codec(format!("bad base64: {error}")))
        }
        "array" => {
            let data = required_child(typed, "data")?;
            data.children()
                .filter(|child| child.has_tag_name("value"))
                .map(decode_value)
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
        "struct" => {
            let mut members = BTreeMap::new();
            for member in typed.children().filter(|child| child.has_tag_name("member")) {
                let name = text_of(required_child(member, "name")?);
                let value = decode_value(required_child(member, "value")?)?;
                members.insert(name, value);
            }
            Ok(Value::Struct(members))
        }
        other => Err(RpcError::codec(format!("unknown value type <{other}>"))),
    }
}

fn child_element<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|child| child.has_tag_name(name))
}

fn required_child<'a, 'input>(
    node: Node<'a, 'input>,
    name: &str,
) -> Result<Node<'a, 'input>, RpcError> {
    child_element(node, name).ok_or_else(|| {
        RpcError::codec(format!(
            "<{}> is missing <{name}>",
            node.tag_name().name()
        ))
    })
}

fn text_of(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(Node::is_text)
        .filter_map(|text| text.text())
        .collect()
}

#[cfg(test)]
mod tests;
