//! Decoder integration tests.
//!
//! Tests verify:
//! - The three wire formats describe the same request the same way
//! - Serialized wire strings decode back to the same parameters
//! - Malformed input never fails decoding

use docuserver::params::{
    COLOP, DH, DW, FN, OPT_ASCALE, OPT_ERRCODE, OPT_INFO, OPT_JPG, PN, ROT, SCALE, WH, WS, WW,
    WX, WY,
};
use docuserver::{IiifSyntax, ParamKind, RequestDecoder, RequestParams, WireFormat};

fn decoder() -> RequestDecoder {
    RequestDecoder::default()
}

fn assert_same_wire_values(a: &RequestParams, b: &RequestParams) {
    for param in a.iter().filter(|p| p.kind() == ParamKind::Wire) {
        let other = b.get(param.name()).unwrap();
        assert_eq!(param.value(), other.value(), "parameter {}", param.name());
    }
}

#[test]
fn test_legacy_and_query_agree() {
    let legacy = decoder().decode(
        WireFormat::Legacy,
        "books/vol1+7+0.75+fit,png+m2+0.1+0.2+0.5+0.6",
    );
    let query = decoder().decode(
        WireFormat::Query,
        "fn=books/vol1&pn=7&ws=0.75&mo=fit,png&mk=m2&wx=0.1&wy=0.2&ww=0.5&wh=0.6",
    );
    assert_eq!(legacy, query);
}

#[test]
fn test_wire_string_round_trip() {
    let original = decoder().decode(
        WireFormat::Query,
        "fn=books/vol1&pn=4&dw=800&ws=1.5&mo=jpg&rot=180&brgt=-0.5&rgba=1/2/3",
    );
    let again = decoder().decode(WireFormat::Query, &original.to_wire_string());

    assert_same_wire_values(&original, &again);
    assert_eq!(again.page_number(), 4);
    assert_eq!(again.float_value(ROT), Some(180.0));
}

#[test]
fn test_legacy_to_wire_string() {
    let params = decoder().decode(WireFormat::Legacy, "books/vol1+3");
    let wire = params.to_wire_string();
    assert!(wire.contains("fn=books/vol1"));
    assert!(wire.contains("pn=3"));
    assert!(!wire.contains("ws="));
    assert!(!wire.contains("request.path"));
}

#[test]
fn test_malformed_legacy_page_is_skipped() {
    let params = decoder().decode(WireFormat::Legacy, "books/vol1+three+0.5");
    assert_eq!(params.str_value(FN), Some("books/vol1"));
    assert!(!params.has_value(PN));
    assert_eq!(params.page_number(), 1);
    assert_eq!(params.float_value(WS), Some(0.5));
}

#[test]
fn test_unknown_query_parameters_are_kept() {
    let params = decoder().decode(WireFormat::Query, "fn=a&lang=de&pn=2");
    let unknown = params.get("lang").unwrap();
    assert_eq!(unknown.kind(), ParamKind::Unknown);
    assert_eq!(unknown.as_str(), Some("de"));
    assert_eq!(params.page_number(), 2);
}

#[test]
fn test_iiif_region_omitted_is_info_request() {
    let short = decoder().decode(WireFormat::Iiif, "iiif/books!vol1");
    let explicit = decoder().decode(WireFormat::Iiif, "iiif/books!vol1/info.json");

    assert!(short.has_option(OPT_INFO));
    assert_eq!(short, explicit);
    assert_eq!(short.str_value(FN), Some("books/vol1"));
}

#[test]
fn test_iiif_decoding_is_idempotent() {
    let path = "iiif/books!vol1!page0002/pct:25,25,50,50/!400,300/270/grey.jpg";

    let mut once = RequestParams::new();
    decoder().decode_into(&mut once, WireFormat::Iiif, path);
    let mut twice = once.clone();
    decoder().decode_into(&mut twice, WireFormat::Iiif, path);

    assert_eq!(once, twice);
    assert_eq!(once.float_value(WX), Some(0.25));
    assert_eq!(once.float_value(WW), Some(0.5));
    assert_eq!(once.int_value(DW), Some(400));
    assert_eq!(once.int_value(DH), Some(300));
    assert_eq!(once.float_value(ROT), Some(270.0));
    assert_eq!(once.str_value(COLOP), Some("grayscale"));
    assert!(once.has_option(OPT_JPG));
    assert!(once.has_option(OPT_ERRCODE));
}

#[test]
fn test_iiif_bad_pct_region_sets_nothing() {
    let params = decoder().decode(WireFormat::Iiif, "iiif/a/pct:10,20,x,40/full/0/default.jpg");
    for name in [WX, WY, WW, WH] {
        assert!(!params.has_value(name), "{} should be unset", name);
    }
    assert!(params.has_option(OPT_ASCALE));
}

#[test]
fn test_iiif_pct_size_auto_scales() {
    let params = decoder().decode(WireFormat::Iiif, "iiif/a/full/pct:50/0/default.jpg");
    assert!(params.has_option(OPT_ASCALE));
    assert_eq!(params.float_value(SCALE), Some(0.5));
    assert!(!params.has_value(DW));
}

#[test]
fn test_iiif_without_slash_replacement() {
    let decoder = RequestDecoder::new(IiifSyntax::default().without_slash_replacement());
    let params = decoder.decode(WireFormat::Iiif, "iiif/books!vol1/info.json");
    assert_eq!(params.str_value(FN), Some("books!vol1"));

    let params = decoder.decode(WireFormat::Iiif, "iiif/books%2Fvol1/info.json");
    assert_eq!(params.str_value(FN), Some("books/vol1"));
}

#[test]
fn test_garbage_never_fails() {
    for raw in ["", "+", "++++++++++++", "&&==&", "=x", "\u{fffd}+\u{0}", "a/b/c/d/e/f/g/h"] {
        for format in [WireFormat::Legacy, WireFormat::Query, WireFormat::Iiif] {
            let params = decoder().decode(format, raw);
            let _ = params.to_wire_string();
        }
    }
}
