//! Common wire documents for tests.

pub const HOTEL_NS: &str = "http://example.org/ns/hotel/v1";
pub const COMMON_NS: &str = "http://example.org/ns/common/v1";

/// A `1.6` library with facets, an open enumeration and a service.
pub const HOTEL_V16: &str = r#"{
    "Dialect": "1.6",
    "Name": "Hotel",
    "Namespace": "http://example.org/ns/hotel/v1",
    "Prefix": "htl",
    "Status": "Draft",
    "Imports": [
        { "Prefix": "xsd", "Namespace": "http://www.w3.org/2001/XMLSchema" },
        { "Prefix": "cmn", "Namespace": "http://example.org/ns/common/v1" }
    ],
    "Members": [
        { "Kind": "SimpleType", "Name": "RoomNumber", "TypeRef": "xsd:string", "MaxLength": 8 },
        {
            "Kind": "Enumeration", "Name": "RoomKind", "Open": true,
            "Values": [ { "Literal": "Single" }, { "Literal": "Double" } ]
        },
        {
            "Kind": "BusinessObject", "Name": "Room",
            "Facets": [
                { "Facet": "ID", "Attributes": [ { "Name": "Number", "TypeRef": "RoomNumber", "Mandatory": true } ] },
                { "Facet": "Summary",
                  "Attributes": [ { "Name": "Kind", "TypeRef": "RoomKind" } ],
                  "Elements": [ { "Name": "Rate", "TypeRef": "cmn:Amount", "Repeat": 0 } ] }
            ]
        },
        {
            "Kind": "Service", "Name": "Booking",
            "Operations": [
                { "Name": "Reserve",
                  "Request": { "Elements": [ { "Name": "Room", "TypeRef": "Room_ID" } ] },
                  "Response": { "Elements": [ { "Name": "Room", "TypeRef": "Room_Summary" } ] } }
            ]
        }
    ]
}"#;

/// A `1.4` library that the hotel library depends on.
pub const COMMON_V14: &str = r#"{
    "Dialect": "1.4",
    "Name": "Common",
    "Namespace": "http://example.org/ns/common/v1",
    "Prefix": "cmn",
    "Status": "Final",
    "Imports": [ { "Prefix": "xsd", "Namespace": "http://www.w3.org/2001/XMLSchema" } ],
    "Members": [
        { "Kind": "Simple", "Name": "Currency", "Type": "xsd:string", "Pattern": "[A-Z]{3}" },
        {
            "Kind": "CoreObject", "Name": "Amount", "Simple": "xsd:decimal",
            "Summary": { "Attributes": [ { "Name": "currency", "Type": "Currency", "Mandatory": true } ] }
        },
        {
            "Kind": "ClosedEnumeration", "Name": "Country",
            "Literals": [ { "Value": "NL" }, { "Value": "DE", "Label": "Germany" } ]
        }
    ]
}"#;
