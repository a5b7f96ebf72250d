use super::GenerateRequest;
use super::GenerateResponse;

/// One recorded turn. Never mutated once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Interaction {
    request: GenerateRequest,
    response: GenerateResponse,
}

impl Interaction {
    pub fn new(request: GenerateRequest, response: GenerateResponse) -> Interaction {
        return Interaction { request, response };
    }

    pub fn request(&self) -> &GenerateRequest {
        return &self.request;
    }

    pub fn response(&self) -> &GenerateResponse {
        return &self.response;
    }
}
