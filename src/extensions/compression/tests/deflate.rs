use crate::extensions::compression::deflate::{on_response, DeflateConfigBuilder};
use http::header::SEC_WEBSOCKET_EXTENSIONS;
use http::{HeaderValue, Response};

mod client {
    use super::*;

    #[test]
    fn splits_on_new_line() {
        let s = "permessage-deflate; client_no_context_takeover; client_max_window_bits=8; server_max_window_bits=10";

        let mut response = Response::new(());
        response
            .headers_mut()
            .insert(SEC_WEBSOCKET_EXTENSIONS, HeaderValue::from_static(s));

        let mut parsed_config = DeflateConfigBuilder::default()
            .server_max_window_bits(10)
            .client_max_window_bits(11)
            .build();

        let r = on_response(&mut response, &mut parsed_config);

        assert_eq!(r, Ok(true));

        let mut expected_config = DeflateConfigBuilder::default()
            .server_max_window_bits(10)
            .client_max_window_bits(8)
            .build();
        expected_config.set_compress_reset(true);

        assert_eq!(parsed_config, expected_config);
    }
}
