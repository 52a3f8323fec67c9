use serde::Serialize;

/// JSON envelope for every `/api` response.
///
/// ```json
/// { "success": true, "data": { "id": 1, "student_code": "STU20240001" }, "message": "Student registered" }
/// ```
///
/// Failures carry `success: false`, an empty `data` and a message that is
/// safe to show to the operator.
#[derive(Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    pub success: bool,
    pub data: T,
    pub message: String,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: message.into(),
        }
    }

    /// Error envelope; `data` is `T::default()`.
    pub fn error(message: impl Into<String>) -> Self
    where
        T: Default,
    {
        Self {
            success: false,
            data: T::default(),
            message: message.into(),
        }
    }
}
