//! Estado de post-procesamiento de una submission.
//!
//! `pending → processing → completed | failed`, sin restricción de aristas:
//! cualquiera de los cuatro valores se acepta desde cualquier otro y el
//! estado del workflow no interviene.
use chrono::Utc;
use form_domain::{Submission, SubmissionStatus};
use log::{info, warn};
use std::str::FromStr;
use uuid::Uuid;

use crate::context::CallContext;
use crate::errors::{CoreError, StoreError};
use crate::store::SubmissionStore;

pub fn parse_submission_status(raw: &str) -> Result<SubmissionStatus, CoreError> {
    SubmissionStatus::from_str(raw).map_err(CoreError::from)
}

pub fn update_submission_status<S: SubmissionStore + ?Sized>(store: &S,
                                                             ctx: &CallContext,
                                                             id: Uuid,
                                                             raw_status: &str)
                                                             -> Result<Submission, CoreError> {
    let status = parse_submission_status(raw_status)?;
    match store.set_submission_status(ctx, id, status, Utc::now()) {
        Ok(sub) => {
            if status.is_terminal() {
                info!("submission {id} finished with status {status}");
            }
            Ok(sub)
        }
        Err(StoreError::NotFound) => {
            warn!("update_submission_status: submission {id} not found");
            Err(CoreError::not_found("submission", id))
        }
        Err(e) => Err(CoreError::from_store("set_submission_status", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_set_is_closed() {
        for st in SubmissionStatus::ALL {
            assert_eq!(parse_submission_status(st.as_str()), Ok(st));
        }
        assert_eq!(parse_submission_status("done"), Err(CoreError::InvalidStatus("done".into())));
        assert!(parse_submission_status("").is_err());
    }
}
