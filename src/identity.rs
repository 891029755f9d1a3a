/// 요청자 식별
/// 인증은 앞단의 세션 제공자가 처리하고, 확인된 사용자 id와 역할을 헤더로 전달한다.
// region:    --- Imports
use crate::auction::model::{Principal, Role, UserId};
use crate::error::AuctionError;
use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;

// endregion: --- Imports

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// 헤더에서 읽은 요청자
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub Principal);

pub fn principal_from_headers(headers: &HeaderMap) -> Result<Principal, AuctionError> {
    let id = headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AuctionError::unauthorized("로그인이 필요합니다."))?
        .trim()
        .parse::<UserId>()
        .map_err(|_| AuctionError::unauthorized("잘못된 사용자 id입니다."))?;

    // 역할 헤더가 없으면 일반 입찰자
    let role = match headers.get(USER_ROLE_HEADER) {
        Some(value) => value
            .to_str()
            .map_err(|_| AuctionError::unauthorized("잘못된 역할입니다."))?
            .trim()
            .parse::<Role>()
            .map_err(AuctionError::unauthorized)?,
        None => Role::Bidder,
    };

    Ok(Principal::new(id, role))
}

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AuctionError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        principal_from_headers(&parts.headers).map(Caller)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn reads_id_and_role() {
        let principal =
            principal_from_headers(&headers(&[("x-user-id", "7"), ("x-user-role", "Super Admin")]))
                .unwrap();
        assert_eq!(principal, Principal::new(7, Role::SuperAdmin));
    }

    #[test]
    fn missing_role_defaults_to_bidder() {
        let principal = principal_from_headers(&headers(&[("x-user-id", "12")])).unwrap();
        assert_eq!(principal.role, Role::Bidder);
    }

    #[test]
    fn rejects_missing_or_malformed_identity() {
        for bad in [
            headers(&[]),
            headers(&[("x-user-id", "abc")]),
            headers(&[("x-user-id", "3"), ("x-user-role", "Janitor")]),
        ] {
            assert_eq!(principal_from_headers(&bad).unwrap_err().code(), "UNAUTHORIZED");
        }
    }
}
