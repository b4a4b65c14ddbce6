//! Dynamic UPDATE messages and their delivery to the nameserver

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use hickory_resolver::proto::ProtoError;
use hickory_resolver::proto::op::{Message, MessageFinalizer, UpdateMessage, update_message};
use hickory_resolver::proto::rr::rdata::TXT;
use hickory_resolver::proto::rr::{Name, RData, Record, RecordSet, RecordType};
use hickory_resolver::proto::runtime::{TokioRuntimeProvider, TokioTime};
use hickory_resolver::proto::tcp::TcpClientStream;
use hickory_resolver::proto::udp::UdpClientStream;
use hickory_resolver::proto::xfer::{
    DnsExchange, DnsHandle, DnsMultiplexer, DnsRequest, DnsRequestOptions, DnsResponse,
    FirstAnswer,
};

/// Change applied to the challenge TXT record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Replace the whole TXT RRset with the single challenge value
    Insert,
    /// Delete the one TXT record holding the challenge value
    Remove,
}

/// Build the UPDATE for `action` on `fqdn` inside `zone`
///
/// `zone` must be `fqdn` or one of its ancestors.
pub fn build(action: Action, zone: &Name, fqdn: &Name, value: &str, ttl: u32) -> Message {
    let txt = Record::from_rdata(
        fqdn.clone(),
        ttl,
        RData::TXT(TXT::new(vec![value.to_string()])),
    );

    match action {
        Action::Insert => {
            let mut message = update_message::delete_rrset(
                Record::update0(fqdn.clone(), 0, RecordType::TXT),
                zone.clone(),
                false,
            );
            message.add_update(txt);
            message
        }
        Action::Remove => {
            update_message::delete_by_rdata(RecordSet::from(txt), zone.clone(), false)
        }
    }
}

/// Send `message` to `server` and wait for its reply
///
/// A truncated UDP reply is retried over TCP. Each attempt is bounded by
/// `timeout`.
pub async fn send(
    server: SocketAddr,
    message: Message,
    signer: Option<Arc<dyn MessageFinalizer>>,
    timeout: Duration,
) -> Result<DnsResponse, ProtoError> {
    let response = send_udp(server, message.clone(), signer.clone(), timeout).await?;
    if !response.truncated() {
        return Ok(response);
    }

    tracing::debug!(%server, "Truncated UDP reply, retrying over TCP");
    send_tcp(server, message, signer, timeout).await
}

async fn send_udp(
    server: SocketAddr,
    message: Message,
    signer: Option<Arc<dyn MessageFinalizer>>,
    timeout: Duration,
) -> Result<DnsResponse, ProtoError> {
    let stream = UdpClientStream::builder(server, TokioRuntimeProvider::default())
        .with_timeout(Some(timeout))
        .with_signer(signer)
        .build();
    let (exchange, background) = DnsExchange::connect::<_, _, TokioTime>(stream).await?;
    tokio::spawn(background);

    exchange
        .send(DnsRequest::new(message, DnsRequestOptions::default()))
        .first_answer()
        .await
}

async fn send_tcp(
    server: SocketAddr,
    message: Message,
    signer: Option<Arc<dyn MessageFinalizer>>,
    timeout: Duration,
) -> Result<DnsResponse, ProtoError> {
    let (stream, handle) =
        TcpClientStream::new(server, None, Some(timeout), TokioRuntimeProvider::default());
    let multiplexer = DnsMultiplexer::with_timeout(stream, handle, timeout, signer);
    let (exchange, background) = DnsExchange::connect::<_, _, TokioTime>(multiplexer).await?;
    tokio::spawn(background);

    exchange
        .send(DnsRequest::new(message, DnsRequestOptions::default()))
        .first_answer()
        .await
}
