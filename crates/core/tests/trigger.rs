//! End-to-end exercise of the client against a loopback HTTP server that
//! speaks just enough of the protocol: it serves the WSDL on GET and answers
//! POSTed calls with a canned binary reply.

use assert_matches::assert_matches;
use indoc::indoc;
use jmmlink_core::nbfx::model::Record;
use jmmlink_core::nbfx::ser::dump_records;
use jmmlink_core::nbfx::xml::{records_to_xml, xml_to_records};
use jmmlink_core::{Credentials, Error, JmmServer};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread;

const WSDL: &str = indoc! {r#"
    <wsdl:definitions xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/"
                      targetNamespace="http://tempuri.org/">
      <wsdl:portType name="IJMMServer">
        <wsdl:operation name="ScanDropFolders"/>
        <wsdl:operation name="GetServerStatus"/>
        <wsdl:operation name="RescanUnlinkedFiles"/>
      </wsdl:portType>
    </wsdl:definitions>"#};

const RESPONSE_XML: &str = concat!(
    "<s:Envelope xmlns:s=\"http://www.w3.org/2003/05/soap-envelope\"",
    " xmlns:a=\"http://www.w3.org/2005/08/addressing\">",
    "<s:Header>",
    "<a:Action s:mustUnderstand=\"1\">",
    "http://tempuri.org/IJMMServer/ScanDropFoldersResponse",
    "</a:Action>",
    "</s:Header>",
    "<s:Body><ScanDropFoldersResponse xmlns=\"http://tempuri.org/\"/></s:Body>",
    "</s:Envelope>",
);

struct Request {
    method: String,
    path: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

fn header<'a>(request: &'a Request, name: &str) -> Option<&'a str> {
    request
        .headers
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, v)| v.as_str())
}

fn read_request(stream: &mut TcpStream) -> Option<Request> {
    let mut reader = BufReader::new(stream.try_clone().ok()?);

    let mut line = String::new();
    if reader.read_line(&mut line).ok()? == 0 {
        return None;
    }
    let mut parts = line.split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();

    let mut headers = Vec::new();
    let mut content_length = 0;
    loop {
        let mut raw = String::new();
        reader.read_line(&mut raw).ok()?;
        let raw = raw.trim_end();
        if raw.is_empty() {
            break;
        }
        let (name, value) = raw.split_once(':')?;
        let value = value.trim().to_string();
        if name.eq_ignore_ascii_case("content-length") {
            content_length = value.parse().ok()?;
        }
        headers.push((name.to_ascii_lowercase(), value));
    }

    let mut body = vec![0; content_length];
    reader.read_exact(&mut body).ok()?;

    Some(Request {
        method,
        path,
        headers,
        body,
    })
}

fn respond(stream: &mut TcpStream, content_type: &str, body: &[u8]) {
    let head = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        content_type,
        body.len()
    );
    stream.write_all(head.as_bytes()).unwrap();
    stream.write_all(body).unwrap();
}

/// Serves the WSDL on GET and `reply` on POST, forwarding every request it
/// saw to the returned channel.
fn spawn_server(reply: Vec<u8>) -> (u16, mpsc::Receiver<Request>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        for stream in listener.incoming() {
            let mut stream = match stream {
                Ok(stream) => stream,
                Err(_) => break,
            };
            let request = match read_request(&mut stream) {
                Some(request) => request,
                None => continue,
            };
            if request.method == "GET" {
                respond(&mut stream, "text/xml", WSDL.as_bytes());
            } else {
                respond(&mut stream, "application/soap+msbin1", &reply);
            }
            if tx.send(request).is_err() {
                break;
            }
        }
    });

    (port, rx)
}

#[test]
fn test_scan_drop_folders_end_to_end() {
    let _ = env_logger::builder().is_test(true).try_init();

    let response_records = xml_to_records(RESPONSE_XML).unwrap();
    let reply = dump_records(&response_records, Vec::new()).unwrap();
    let (port, requests) = spawn_server(reply);

    let credentials = Credentials::new(Some("jesse"), Some("hunter2"));
    let server = JmmServer::connect("127.0.0.1", port, credentials).unwrap();

    let text = server.scan_drop_folders().unwrap();
    assert!(text.contains("ScanDropFoldersResponse"));

    let wsdl_request = requests.recv().unwrap();
    assert_eq!(wsdl_request.method, "GET");
    assert_eq!(wsdl_request.path, "/ServiceBinary?singleWsdl");
    assert_eq!(
        header(&wsdl_request, "authorization"),
        Some("Basic amVzc2U6aHVudGVyMg==")
    );

    let call = requests.recv().unwrap();
    assert_eq!(call.method, "POST");
    assert_eq!(call.path, "/ServiceBinary");
    assert_eq!(
        header(&call, "content-type"),
        Some("application/soap+msbin1")
    );
    assert_eq!(
        header(&call, "authorization"),
        Some("Basic amVzc2U6aHVudGVyMg==")
    );

    // The binary body must decode back to an envelope naming the operation.
    let records = Record::parse_document(&call.body).unwrap();
    let dump = records_to_xml(&records).unwrap();
    assert!(dump.contains("http://tempuri.org/IJMMServer/ScanDropFolders"));
    assert!(dump.contains("<ScanDropFolders xmlns=\"http://tempuri.org/\"/>"));
}

#[test]
fn test_unknown_operation_fails_fast() {
    let (port, requests) = spawn_server(Vec::new());

    let server = JmmServer::connect("127.0.0.1", port, Credentials::Anonymous).unwrap();
    assert_matches!(
        server.call("FormatDisk"),
        Err(Error::UnknownOperation { operation }) if operation == "FormatDisk"
    );

    // Only the WSDL fetch hit the wire, and it carried no credentials.
    let wsdl_request = requests.recv().unwrap();
    assert_eq!(wsdl_request.method, "GET");
    assert_eq!(header(&wsdl_request, "authorization"), None);
    assert!(requests.try_recv().is_err());
}

#[test]
fn test_advertised_operations() {
    let (port, _requests) = spawn_server(Vec::new());

    let server = JmmServer::connect("127.0.0.1", port, Credentials::Anonymous).unwrap();
    let mut operations: Vec<&str> = server.operations().collect();
    operations.sort_unstable();
    assert_eq!(
        operations,
        vec!["GetServerStatus", "RescanUnlinkedFiles", "ScanDropFolders"]
    );
}
