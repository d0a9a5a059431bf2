//! Tests for Installation Client
//!
//! **Specification**: `github-bot-sdk-specs/interfaces/installation-client.md`

use super::*;

mod construction_tests {
    use super::*;

    #[test]
    fn test_installation_client_creation() {
        todo!("Verify InstallationClient::new creates client with correct installation_id")
    }

    #[test]
    fn test_installation_id_accessor() {
        todo!("Verify installation_id() returns correct ID")
    }

    #[tokio::test]
    async fn test_github_client_installation_by_id() {
        todo!("Verify GitHubClient::installation_by_id creates installation client")
    }
}

mod http_request_tests {
    use super::*;

    #[tokio::test]
    async fn test_get_request() {
        todo!("Verify GET request with installation token authentication")
    }

    #[tokio::test]
    async fn test_post_request() {
        todo!("Verify POST request with JSON body serialization")
    }

    #[tokio::test]
    async fn test_put_request() {
        todo!("Verify PUT request with JSON body")
    }

    #[tokio::test]
    async fn test_delete_request() {
        todo!("Verify DELETE request")
    }

    #[tokio::test]
    async fn test_patch_request() {
        todo!("Verify PATCH request with JSON body")
    }
}

mod path_normalization_tests {
    use super::*;

    #[tokio::test]
    async fn test_path_with_leading_slash() {
        todo!("Verify paths with leading slash are normalized")
    }

    #[tokio::test]
    async fn test_path_without_leading_slash() {
        todo!("Verify paths without leading slash work correctly")
    }
}

mod token_management_tests {
    use super::*;

    #[tokio::test]
    async fn test_installation_token_retrieval() {
        todo!("Verify installation token is obtained from auth provider")
    }

    #[tokio::test]
    async fn test_token_error_propagation() {
        todo!("Verify token generation failures are mapped to ApiError")
    }
}

mod error_handling_tests {
    use super::*;

    #[tokio::test]
    async fn test_network_error_mapping() {
        todo!("Verify network errors are mapped to ApiError::HttpClientError")
    }

    #[tokio::test]
    async fn test_timeout_error() {
        todo!("Verify timeout errors are mapped to ApiError::Timeout")
    }

    #[tokio::test]
    async fn test_rate_limit_error() {
        todo!("Verify 429 responses are mapped to ApiError::RateLimitExceeded")
    }

    #[tokio::test]
    async fn test_permission_denied_error() {
        todo!("Verify 403 responses are mapped to ApiError::PermissionDenied")
    }

    #[tokio::test]
    async fn test_not_found_error() {
        todo!("Verify 404 responses are mapped to ApiError::NotFound")
    }
}

mod authorization_header_tests {
    use super::*;

    #[tokio::test]
    async fn test_bearer_token_header() {
        todo!("Verify Authorization: Bearer header is set correctly")
    }

    #[tokio::test]
    async fn test_accept_header() {
        todo!("Verify Accept: application/vnd.github+json header is set")
    }

    #[tokio::test]
    async fn test_user_agent_header() {
        todo!("Verify User-Agent header is set from client config")
    }
}
