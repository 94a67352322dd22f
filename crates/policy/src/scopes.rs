//! IAM action names the console gates on.

/// Prefix carried by S3 resource ARNs in server payloads.
pub const RESOURCE_ARN_PREFIX: &str = "arn:aws:s3:::";

pub const S3_ALL_ACTIONS: &str = "s3:*";
pub const S3_GET_ACTIONS: &str = "s3:Get*";
pub const S3_PUT_ACTIONS: &str = "s3:Put*";
pub const S3_LIST_ACTIONS: &str = "s3:List*";
pub const ADMIN_ALL_ACTIONS: &str = "admin:*";

pub const S3_GET_OBJECT: &str = "s3:GetObject";
pub const S3_PUT_OBJECT: &str = "s3:PutObject";
pub const S3_DELETE_OBJECT: &str = "s3:DeleteObject";
pub const S3_LIST_BUCKET: &str = "s3:ListBucket";
pub const S3_ALL_LIST_BUCKET: &str = "s3:ListAllMyBuckets";
pub const S3_CREATE_BUCKET: &str = "s3:CreateBucket";
pub const S3_DELETE_BUCKET: &str = "s3:DeleteBucket";
pub const S3_GET_BUCKET_VERSIONING: &str = "s3:GetBucketVersioning";
pub const S3_PUT_BUCKET_VERSIONING: &str = "s3:PutBucketVersioning";
pub const S3_GET_OBJECT_RETENTION: &str = "s3:GetObjectRetention";
pub const S3_PUT_OBJECT_RETENTION: &str = "s3:PutObjectRetention";
pub const S3_BYPASS_GOVERNANCE_RETENTION: &str = "s3:BypassGovernanceRetention";

/// Scopes that allow uploading into a bucket.
pub const UPLOAD_SCOPES: &[&str] = &[S3_PUT_OBJECT, S3_PUT_ACTIONS];

/// Scopes that allow browsing a bucket's listing.
pub const BROWSE_SCOPES: &[&str] = &[S3_LIST_BUCKET, S3_ALL_LIST_BUCKET];

/// Hint shown on an affordance disabled for lack of permissions.
pub fn permission_tooltip(scopes: &[&str], action: &str) -> String {
    format!(
        "You require additional permissions in order to {action}. \
         Please ask your administrator for the following [{}] permission.",
        scopes.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_tooltip_lists_scopes() {
        let tip = permission_tooltip(UPLOAD_SCOPES, "upload files to this bucket");
        assert!(tip.contains("in order to upload files to this bucket."));
        assert!(tip.contains("[s3:PutObject, s3:Put*]"));
    }
}
