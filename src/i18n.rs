#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Language {
    #[default]
    En,
    Zh,
    Fr,
    Es,
}

impl Language {
    pub const ALL: [Language; 4] = [Language::En, Language::Zh, Language::Fr, Language::Es];

    /// Maps a stored `LANGUAGE` value to a supported language, falling back to English.
    pub fn from_code(s: &str) -> Self {
        let s = s.to_lowercase();
        if s.starts_with("zh") {
            Language::Zh
        } else if s.starts_with("fr") {
            Language::Fr
        } else if s.starts_with("es") {
            Language::Es
        } else {
            Language::En
        }
    }

    /// The value written to the config file when this language is selected.
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Zh => "zh-Hans",
            Language::Fr => "fr",
            Language::Es => "es",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Zh => "简体中文",
            Language::Fr => "Français",
            Language::Es => "Español",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum MessageKey {
    StartingConversation,
    PromptUser,
    PromptPlaceholder,
    PleaseEnterPrompt,
    Thinking,
    ReplyHeader,
    Goodbye,
    PleaseSetConfig,
    RunConfigHint,
    SetConfig,
    OpenAiKey,
    OpenAiApiEndpoint,
    AzureDeployment,
    LanguageSetting,
    Cancel,
    NotSet,
    EnterApiKey,
    PleaseEnterKey,
    EnterApiEndpoint,
    EnterDeployment,
    EnterLanguage,
    Running,
}

pub fn t(lang: &Language, key: MessageKey) -> &'static str {
    use Language::*;
    use MessageKey::*;

    match (lang, key) {
        (En, StartingConversation) => "Starting new conversation",
        (Zh, StartingConversation) => "开始新的对话",
        (Fr, StartingConversation) => "Démarrage d'une nouvelle conversation",
        (Es, StartingConversation) => "Iniciando nueva conversación",

        (En, PromptUser) => "You:",
        (Zh, PromptUser) => "你:",
        (Fr, PromptUser) => "Vous :",
        (Es, PromptUser) => "Tú:",

        (En, PromptPlaceholder) => "send a message ('exit' to quit)",
        (Zh, PromptPlaceholder) => "发送消息（输入 'exit' 退出）",
        (Fr, PromptPlaceholder) => "envoyer un message ('exit' pour quitter)",
        (Es, PromptPlaceholder) => "envía un mensaje ('exit' para salir)",

        (En, PleaseEnterPrompt) => "Please enter a prompt.",
        (Zh, PleaseEnterPrompt) => "请输入提示。",
        (Fr, PleaseEnterPrompt) => "Veuillez saisir un message.",
        (Es, PleaseEnterPrompt) => "Por favor, introduce un mensaje.",

        (En, Thinking) => "THINKING...",
        (Zh, Thinking) => "思考中...",
        (Fr, Thinking) => "RÉFLEXION...",
        (Es, Thinking) => "PENSANDO...",

        (En, ReplyHeader) => "AI Chat:",
        (Zh, ReplyHeader) => "AI 对话:",
        (Fr, ReplyHeader) => "Chat IA :",
        (Es, ReplyHeader) => "Chat IA:",

        (En, Goodbye) => "Goodbye!",
        (Zh, Goodbye) => "再见！",
        (Fr, Goodbye) => "Au revoir !",
        (Es, Goodbye) => "¡Adiós!",

        (En, PleaseSetConfig) => "Please set config and restart command.",
        (Zh, PleaseSetConfig) => "请先完成配置，然后重新运行命令。",
        (Fr, PleaseSetConfig) => "Veuillez configurer l'outil puis relancer la commande.",
        (Es, PleaseSetConfig) => "Configura la herramienta y vuelve a ejecutar el comando.",

        (En, RunConfigHint) => "Run `ai-chat config` to set your API key, endpoint and deployment.",
        (Zh, RunConfigHint) => "运行 `ai-chat config` 设置 API 密钥、端点和部署。",
        (Fr, RunConfigHint) => "Lancez `ai-chat config` pour définir la clé API, le point de terminaison et le déploiement.",
        (Es, RunConfigHint) => "Ejecuta `ai-chat config` para definir la clave API, el endpoint y el despliegue.",

        (En, SetConfig) => "Set config",
        (Zh, SetConfig) => "设置配置",
        (Fr, SetConfig) => "Configurer",
        (Es, SetConfig) => "Configurar",

        (En, OpenAiKey) => "OpenAI Key",
        (Zh, OpenAiKey) => "OpenAI 密钥",
        (Fr, OpenAiKey) => "Clé OpenAI",
        (Es, OpenAiKey) => "Clave de OpenAI",

        (En, OpenAiApiEndpoint) => "OpenAI API Endpoint",
        (Zh, OpenAiApiEndpoint) => "OpenAI API 端点",
        (Fr, OpenAiApiEndpoint) => "Point de terminaison de l'API OpenAI",
        (Es, OpenAiApiEndpoint) => "Endpoint de la API de OpenAI",

        (En, AzureDeployment) => "Azure OpenAI Deployment",
        (Zh, AzureDeployment) => "Azure OpenAI 部署",
        (Fr, AzureDeployment) => "Déploiement Azure OpenAI",
        (Es, AzureDeployment) => "Despliegue de Azure OpenAI",

        (En, LanguageSetting) => "Language",
        (Zh, LanguageSetting) => "语言",
        (Fr, LanguageSetting) => "Langue",
        (Es, LanguageSetting) => "Idioma",

        (En, Cancel) => "Cancel (exit the program)",
        (Zh, Cancel) => "取消（退出程序）",
        (Fr, Cancel) => "Annuler (quitter le programme)",
        (Es, Cancel) => "Cancelar (salir del programa)",

        (En, NotSet) => "(not set)",
        (Zh, NotSet) => "（未设置）",
        (Fr, NotSet) => "(non défini)",
        (Es, NotSet) => "(sin definir)",

        (En, EnterApiKey) => "Enter your OpenAI API key",
        (Zh, EnterApiKey) => "输入您的 OpenAI API 密钥",
        (Fr, EnterApiKey) => "Saisissez votre clé API OpenAI",
        (Es, EnterApiKey) => "Introduce tu clave API de OpenAI",

        (En, PleaseEnterKey) => "Please enter a key",
        (Zh, PleaseEnterKey) => "请输入密钥",
        (Fr, PleaseEnterKey) => "Veuillez saisir une clé",
        (Es, PleaseEnterKey) => "Por favor, introduce una clave",

        (En, EnterApiEndpoint) => "Enter your OpenAI API Endpoint",
        (Zh, EnterApiEndpoint) => "输入您的 OpenAI API 端点",
        (Fr, EnterApiEndpoint) => "Saisissez le point de terminaison de l'API OpenAI",
        (Es, EnterApiEndpoint) => "Introduce el endpoint de la API de OpenAI",

        (En, EnterDeployment) => "Enter your Azure OpenAI API Deployment ID",
        (Zh, EnterDeployment) => "输入您的 Azure OpenAI 部署 ID",
        (Fr, EnterDeployment) => "Saisissez l'identifiant de déploiement Azure OpenAI",
        (Es, EnterDeployment) => "Introduce el ID de despliegue de Azure OpenAI",

        (En, EnterLanguage) => "Enter the language you want to use",
        (Zh, EnterLanguage) => "选择您要使用的语言",
        (Fr, EnterLanguage) => "Choisissez la langue à utiliser",
        (Es, EnterLanguage) => "Elige el idioma que quieres usar",

        (En, Running) => "Running",
        (Zh, Running) => "正在运行",
        (Fr, Running) => "Exécution",
        (Es, Running) => "Ejecutando",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_from_code() {
        assert_eq!(Language::from_code("zh-Hans"), Language::Zh);
        assert_eq!(Language::from_code("zh_CN"), Language::Zh);
        assert_eq!(Language::from_code("FR"), Language::Fr);
        assert_eq!(Language::from_code("es-MX"), Language::Es);
        assert_eq!(Language::from_code("en"), Language::En);
        assert_eq!(Language::from_code(""), Language::En);
        assert_eq!(Language::from_code("unknown"), Language::En);
    }

    #[test]
    fn test_code_round_trips() {
        for lang in Language::ALL {
            assert_eq!(Language::from_code(lang.code()), lang);
        }
    }

    #[test]
    fn test_translation() {
        assert_eq!(t(&Language::En, MessageKey::PromptUser), "You:");
        assert_eq!(t(&Language::Fr, MessageKey::Goodbye), "Au revoir !");
        assert_eq!(t(&Language::Zh, MessageKey::Thinking), "思考中...");
    }
}
