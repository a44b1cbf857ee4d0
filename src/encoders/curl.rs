use crate::encoders::escape::quote_plus;
use crate::stage::{
    Encoder, ParamDefault, ParamSpec, ParamType, Params, Preparation, StageError, StageType,
};

/// Deliver the command to a web endpoint with a `curl` POST.
#[derive(Debug, Clone)]
pub struct CurlEncoder {
    url: String,
    data: String,
    replace: String,
}

impl StageType for CurlEncoder {
    const NAME: &'static str = "CurlEncoder";
    const HELP: &'static str = "Posts the form-encoded command to a URL with curl, spliced into \
                                the data template in place of the placeholder.";
    const SCHEMA: &'static [ParamSpec] = &[
        ParamSpec::required("url", ParamType::Text, "Target URL"),
        ParamSpec::required("data", ParamType::Text, "POST body template"),
        ParamSpec::optional(
            "replace",
            ParamType::Text,
            ParamDefault::Text("***"),
            "Placeholder in the data template replaced by the command",
        ),
    ];

    fn from_params(params: &Params) -> Result<Self, StageError> {
        Ok(Self {
            url: params.text("url")?,
            data: params.text("data")?,
            replace: params.text("replace")?,
        })
    }
}

impl Encoder for CurlEncoder {
    fn encode(&self, command: &str, _prep: &Preparation) -> String {
        let data = self.data.replace(&self.replace, &quote_plus(command));
        format!("curl -s -k -X POST --data-binary \"{}\" \"{}\"", data, self.url)
    }
}
