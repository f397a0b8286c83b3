use std::io::Read;
use std::time::Duration;

/// Feeds larger than this are rejected rather than buffered.
const MAX_BODY_BYTES: u64 = 32 * 1024 * 1024;

pub(crate) fn get_bytes(
    url: &str,
    connect_timeout: Duration,
    read_timeout: Duration,
) -> Result<Vec<u8>, String> {
    let agent = ureq::AgentBuilder::new()
        .timeout_connect(connect_timeout)
        .timeout_read(read_timeout)
        .timeout_write(read_timeout)
        .build();

    match agent.get(url).call() {
        Ok(response) => {
            let mut body = Vec::new();
            response
                .into_reader()
                .take(MAX_BODY_BYTES + 1)
                .read_to_end(&mut body)
                .map_err(|err| format!("request failed: response read failed: {err}"))?;
            if body.len() as u64 > MAX_BODY_BYTES {
                return Err(format!(
                    "request failed: response exceeds {MAX_BODY_BYTES} bytes"
                ));
            }
            Ok(body)
        }
        Err(ureq::Error::Status(status, response)) => {
            let response_body = response.into_string().ok().unwrap_or_default();
            let body = response_body.trim();
            if body.is_empty() {
                Err(format!("request failed: HTTP status {status}"))
            } else {
                let truncated = body.chars().take(240).collect::<String>();
                Err(format!("request failed: HTTP status {status} ({truncated})"))
            }
        }
        Err(ureq::Error::Transport(err)) => Err(format!("request failed: transport error: {err}")),
    }
}

#[cfg(test)]
pub(crate) mod test_server {
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    /// A canned response, optionally sent after a pause.
    #[derive(Debug, Clone)]
    pub(crate) struct Reply {
        status: u16,
        body: String,
        delay: Duration,
    }

    impl Reply {
        pub(crate) fn ok(body: &str) -> Self {
            Self::status(200, body)
        }

        pub(crate) fn status(status: u16, body: &str) -> Self {
            Self {
                status,
                body: body.to_string(),
                delay: Duration::ZERO,
            }
        }

        pub(crate) fn after(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    /// Loopback server answering one connection per queued reply, in order.
    pub(crate) struct TestServer {
        pub(crate) base_url: String,
        hits: Arc<AtomicUsize>,
    }

    impl TestServer {
        pub(crate) fn spawn(replies: Vec<Reply>) -> Self {
            let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind test server");
            let base_url = format!("http://{}", listener.local_addr().expect("local addr"));
            let hits = Arc::new(AtomicUsize::new(0));
            let counter = Arc::clone(&hits);

            thread::spawn(move || {
                for reply in replies {
                    let Ok((mut stream, _)) = listener.accept() else {
                        return;
                    };
                    counter.fetch_add(1, Ordering::SeqCst);
                    let _ = answer(&mut stream, &reply);
                }
            });

            Self { base_url, hits }
        }

        pub(crate) fn hits(&self) -> usize {
            self.hits.load(Ordering::SeqCst)
        }
    }

    fn answer(stream: &mut TcpStream, reply: &Reply) -> std::io::Result<()> {
        stream.set_read_timeout(Some(Duration::from_millis(200)))?;
        let mut head = Vec::new();
        let mut buf = [0_u8; 512];
        while !head.windows(4).any(|window| window == b"\r\n\r\n") {
            let read = stream.read(&mut buf)?;
            if read == 0 {
                break;
            }
            head.extend_from_slice(&buf[..read]);
        }

        thread::sleep(reply.delay);
        write!(
            stream,
            "HTTP/1.1 {} Canned\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            reply.status,
            reply.body.len()
        )?;
        stream.write_all(reply.body.as_bytes())?;
        stream.flush()
    }
}
