//! Unit tests for the XML-RPC codec.

use rstest::rstest;

use super::*;

fn response(value: &str) -> String {
    format!(
        "<?xml version=\"1.0\"?>\n<methodResponse>\n  <params>\n    <param>{value}</param>\n  </params>\n</methodResponse>"
    )
}

fn method(name: &str) -> MethodName {
    MethodName::parse(name).expect("valid method name")
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

#[rstest]
fn call_wraps_params_in_envelope() {
    let params = [Value::Struct(BTreeMap::from([(
        "request_id".to_owned(),
        Value::Int(42),
    )]))];
    let xml = encode_call(&method("pem.getRequestStatus"), &params);
    assert_eq!(
        xml,
        "<?xml version=\"1.0\"?><methodCall><methodName>pem.getRequestStatus</methodName>\
         <params><param><value><struct><member><name>request_id</name>\
         <value><int>42</int></value></member></struct></value></param></params></methodCall>"
    );
}

#[rstest]
#[case(Value::Nil, "<value><nil/></value>")]
#[case(Value::Bool(true), "<value><boolean>1</boolean></value>")]
#[case(Value::Int(5_000_000_000), "<value><i8>5000000000</i8></value>")]
#[case(Value::Double(1.5), "<value><double>1.5</double></value>")]
#[case(Value::String("a<b&c".into()), "<value><string>a&lt;b&amp;c</string></value>")]
#[case(Value::Base64(b"key".to_vec()), "<value><base64>a2V5</base64></value>")]
#[case(
    Value::Array(vec![Value::Int(1), Value::String("x".into())]),
    "<value><array><data><value><int>1</int></value><value><string>x</string></value></data></array></value>"
)]
fn values_encode(#[case] value: Value, #[case] expected: &str) {
    let xml = encode_call(&method("m"), &[value]);
    assert!(xml.contains(expected), "{xml} should contain {expected}");
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

#[rstest]
#[case("<value><i4>7</i4></value>", Value::Int(7))]
#[case("<value><int> -3 </int></value>", Value::Int(-3))]
#[case("<value><i8>5000000000</i8></value>", Value::Int(5_000_000_000))]
#[case("<value><boolean>0</boolean></value>", Value::Bool(false))]
#[case("<value><double>2.25</double></value>", Value::Double(2.25))]
#[case("<value><string>a &amp; b</string></value>", Value::String("a & b".into()))]
#[case("<value>untyped</value>", Value::String("untyped".into()))]
#[case("<value><string/></value>", Value::String(String::new()))]
#[case("<value><nil/></value>", Value::Nil)]
#[case(
    "<value><dateTime.iso8601>20260101T00:00:00</dateTime.iso8601></value>",
    Value::DateTime("20260101T00:00:00".into())
)]
#[case("<value><base64>a2V5\n</base64></value>", Value::Base64(b"key".to_vec()))]
fn scalars_decode(#[case] value: &str, #[case] expected: Value) {
    assert_eq!(decode_response(&response(value)).expect("decoded"), expected);
}

#[rstest]
fn platform_envelope_decodes() {
    let xml = response(
        "<value><struct>\
           <member><name>status</name><value><i4>0</i4></value></member>\
           <member><name>result</name><value><struct>\
             <member><name>request_status</name><value><i4>1</i4></value></member>\
           </struct></value></member>\
         </struct></value>",
    );
    let envelope = decode_response(&xml).expect("decoded");
    assert_eq!(envelope.get("status"), Some(&Value::Int(0)));
    let status = envelope
        .get("result")
        .and_then(|result| result.get("request_status"));
    assert_eq!(status, Some(&Value::Int(1)));
}

#[rstest]
fn arrays_decode_in_order() {
    let xml = response(
        "<value><array><data>\
           <value><string>b</string></value>\
           <value><string>a</string></value>\
         </data></array></value>",
    );
    assert_eq!(
        decode_response(&xml).expect("decoded"),
        Value::Array(vec![Value::String("b".into()), Value::String("a".into())])
    );
}

#[rstest]
fn empty_params_decode_to_nil() {
    let xml = "<methodResponse><params/></methodResponse>";
    assert_eq!(decode_response(xml).expect("decoded"), Value::Nil);
}

#[rstest]
fn faults_become_errors() {
    let xml = "<methodResponse><fault><value><struct>\
               <member><name>faultCode</name><value><int>-32601</int></value></member>\
               <member><name>faultString</name><value><string>no such method</string></value></member>\
               </struct></value></fault></methodResponse>";
    match decode_response(xml) {
        Err(RpcError::Fault { code, message }) => {
            assert_eq!(code, -32601);
            assert_eq!(message, "no such method");
        }
        other => panic!("expected fault, got {other:?}"),
    }
}

#[rstest]
#[case("not xml")]
#[case("<methodCall/>")]
#[case("<methodResponse/>")]
#[case("<methodResponse><params><param><value><int>x</int></value></param></params></methodResponse>")]
#[case("<methodResponse><params><param><value><blob/></value></param></params></methodResponse>")]
#[case("<methodResponse><fault><value><struct/></value></fault></methodResponse>")]
fn malformed_responses_are_codec_errors(#[case] xml: &str) {
    assert!(matches!(decode_response(xml), Err(RpcError::Codec { .. })));
}
